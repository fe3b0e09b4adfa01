//! Native adapters for the `scout-core` ports: an OpenAI-compatible
//! completion client, Google Custom Search, credential validators and
//! transcript storage backends.

pub mod llm;
pub mod search;
pub mod storage;
pub mod credentials;

#[cfg(test)]
mod tests;
