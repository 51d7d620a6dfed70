pub mod call_graph;

pub use call_graph::{
    CallGraphBuilder, DefinitionIndex, ExtractionPhase, ExtractionProgress, ExtractionResult,
};
