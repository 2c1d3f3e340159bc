/*!
 * Subtitle document model.
 *
 * A `Document` holds the three entity classes the action library works on:
 * - metadata: the ordered `[Script Info]` header
 * - styles: named formatting records
 * - events: ordered cues
 *
 * ASS/SSA and SRT files load into the same model; SRT input gets the
 * default header and a single `Default` style.
 */

pub mod ass;
pub mod document;
pub mod srt;

pub use document::{
    Document, Event, EventId, EventKind, Metadata, Style, StyleId, SubtitleFormat,
};
