use std::fmt::Write;

use quantum::document::block::{Block, BlockId};
use quantum::document::element::Element;
use quantum::scope::ChainView;
use quantum::value::Value;

use crate::executor::{Execution, Handle};

impl Execution {
    /// Render every block and, for scope blocks, their chains in reading order.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for block in self.document.blocks() {
            self.render_block(&mut out, block);
        }
        out
    }

    fn render_block(&self, out: &mut String, block: &Block) {
        let id = block.id();
        let _ = write!(
            out,
            "{} ({}) at {}",
            self.block_label(id),
            block.type_name(),
            block.position()
        );
        let Element::Scope(scope) = block.element() else {
            out.push('\n');
            return;
        };
        if !scope.name().is_empty() {
            let _ = write!(out, " name '{}'", scope.name());
        }
        if scope.closed() {
            out.push_str(" closed");
        }
        out.push('\n');

        let resolver = scope.resolver();
        for chain in resolver.chains() {
            self.render_chain(out, id, chain);
        }
        for getter in resolver.unresolved_getters() {
            let _ = writeln!(
                out,
                "  unresolved {} '{}' at {}",
                self.label(Handle::Getter(id, getter.id())),
                getter.name(),
                getter.position()
            );
        }
    }

    fn render_chain(&self, out: &mut String, block: BlockId, chain: ChainView<'_, Value>) {
        let poisoned = if chain.is_poisoned() { " (poisoned)" } else { "" };
        let _ = writeln!(out, "  {}{}:", chain.name(), poisoned);
        for (index, variable) in chain.iter().enumerate() {
            let label = if variable.is_import() {
                "import".to_string()
            } else {
                self.label(Handle::Variable(block, variable.id()))
            };
            let _ = write!(
                out,
                "    [{}] {} {} = {}",
                index,
                variable.position(),
                label,
                variable.data()
            );
            let mut getters: Vec<String> = variable
                .getters()
                .iter()
                .map(|g| self.label(Handle::Getter(block, *g)))
                .collect();
            getters.sort();
            if !getters.is_empty() {
                let _ = write!(out, " <- {}", getters.join(", "));
            }
            out.push('\n');
        }
    }

    fn block_label(&self, id: BlockId) -> String {
        self.blocks
            .iter()
            .find(|(_, b)| **b == id)
            .map(|(label, _)| label.clone())
            .unwrap_or_else(|| id.to_string())
    }

    fn label(&self, handle: Handle) -> String {
        self.labels
            .iter()
            .find(|(_, h)| **h == handle)
            .map(|(label, _)| label.clone())
            .unwrap_or_else(|| match handle {
                Handle::Variable(_, id) => id.to_string(),
                Handle::Getter(_, id) => id.to_string(),
            })
    }
}
