//! Data-source attribution.
//!
//! Labels a turn by the sources its tool messages drew on. Structured
//! provenance on each tool message is authoritative; for tool messages
//! without it, the serialized text is checked for each source's
//! `Data Source: <tag>` line.

use crate::rag::types::DataSourceLabel;
use crate::types::DataSource;
use groundwork_llm::Message;

/// Compute the label for one turn's tool messages.
///
/// `messages` should hold only the current turn's messages; non-tool
/// messages are ignored. `sources` supplies the tags for text matching.
pub fn attribute(messages: &[Message], sources: &[DataSource]) -> DataSourceLabel {
    let mut found: Vec<&str> = Vec::new();

    for message in messages.iter().filter(|m| m.is_tool()) {
        let provenance = message.provenance();
        if provenance.is_empty() {
            for source in sources {
                if message.content().contains(&source.marker()) {
                    found.push(&source.label);
                }
            }
        } else {
            found.extend(provenance.iter().map(String::as_str));
        }
    }

    found.sort_unstable();
    found.dedup();

    match found.as_slice() {
        [] => DataSourceLabel::None,
        [only] => DataSourceLabel::Source((*only).to_string()),
        _ => DataSourceLabel::Both,
    }
}
