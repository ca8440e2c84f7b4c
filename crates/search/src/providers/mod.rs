//! Search service adapters.

pub mod tavily;

pub use tavily::TavilyRetriever;
