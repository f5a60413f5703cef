//! C preprocessor rendering of guarded regions.

use vk_loadgen_core::{Guard, TextSink};

/// A [`TextSink`] that renders regions as `#if <guard>` / `#endif` blocks.
///
/// The empty guard renders as `#if 1`, so an unguarded run stays a valid,
/// distinct region.
///
/// # Examples
///
/// ```
/// use vk_loadgen_codegen::PreprocessorSink;
/// use vk_loadgen_core::{Guard, TextSink};
///
/// let mut sink = PreprocessorSink::new();
/// sink.open_region(&Guard::defined("VK_KHR_surface"));
/// sink.fragment("static PFN_vkDestroySurfaceKHR pfn_vkDestroySurfaceKHR;\n");
/// sink.close_region();
/// assert_eq!(
///     sink.into_string(),
///     "#if defined(VK_KHR_surface)\nstatic PFN_vkDestroySurfaceKHR pfn_vkDestroySurfaceKHR;\n#endif\n"
/// );
/// ```
#[derive(Debug, Default, Clone)]
pub struct PreprocessorSink {
    out: String,
    depth: usize,
}

impl PreprocessorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    /// Number of regions currently open.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

impl TextSink for PreprocessorSink {
    fn fragment(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn open_region(&mut self, guard: &Guard) {
        if guard.is_always() {
            self.out.push_str("#if 1\n");
        } else {
            self.out.push_str("#if ");
            self.out.push_str(guard.as_str());
            self.out.push('\n');
        }
        self.depth += 1;
    }

    fn close_region(&mut self) {
        self.out.push_str("#endif\n");
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vk_loadgen_core::RegionEmitter;

    #[test]
    fn test_empty_guard_renders_if_1() {
        let mut sink = PreprocessorSink::new();
        sink.open_region(&Guard::always());
        sink.close_region();
        assert_eq!(sink.as_str(), "#if 1\n#endif\n");
    }

    #[test]
    fn test_emitter_groups_adjacent_items() {
        let x = Guard::defined("X");
        let y = Guard::defined("Y");
        let mut sink = PreprocessorSink::new();
        let mut emitter = RegionEmitter::new(&mut sink);
        for (guard, line) in [(&x, "a\n"), (&x, "b\n"), (&y, "c\n"), (&x, "d\n")] {
            emitter.item(guard, |sink| sink.fragment(line));
        }
        assert_eq!(emitter.finish(), 3);
        assert_eq!(sink.depth(), 0);
        assert_eq!(
            sink.as_str(),
            "#if defined(X)\na\nb\n#endif\n#if defined(Y)\nc\n#endif\n#if defined(X)\nd\n#endif\n"
        );
    }

    #[test]
    fn test_no_items_no_markers() {
        let mut sink = PreprocessorSink::new();
        let emitter = RegionEmitter::new(&mut sink);
        assert_eq!(emitter.finish(), 0);
        assert!(sink.as_str().is_empty());
    }
}
