//! Candidate context windows and their overlap-merge (§4.10.3 steps 1-3).

use codetriever_vector_data::SearchHit;

/// A candidate snippet window: `[start, end)` into the backing file's text,
/// plus the minimum distance among the hits it absorbed.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateWindow {
    pub start: usize,
    pub end: usize,
    pub distance: f32,
    pub source: String,
    pub source_type: String,
    pub transcription_path: Option<String>,
}

/// Builds a context-extended candidate window from one search hit, clamping
/// `start` at zero. Returns `None` if the hit is missing required metadata.
#[must_use]
pub fn candidate_from_hit(hit: &SearchHit, context_chars: usize) -> Option<CandidateWindow> {
    let metadata = &hit.chunk.metadata;
    let source = metadata.get("source")?.as_str()?.to_string();
    let source_type = metadata.get("source_type")?.as_str()?.to_string();
    let start_index = metadata.get("start_index")?.as_u64()? as usize;
    let end_index = metadata.get("end_index")?.as_u64()? as usize;
    let transcription_path = metadata.get("transcription_path").and_then(|v| v.as_str()).map(str::to_string);

    let start = start_index.saturating_sub(context_chars);
    let end = end_index.saturating_add(context_chars);

    Some(CandidateWindow { start, end, distance: hit.distance, source, source_type, transcription_path })
}

/// Sorts by start ascending and merges overlapping/adjacent windows into
/// maximal runs. Merged distance is the true minimum of the absorbed
/// windows, tracked as its own value rather than folded into the
/// running-end computation.
#[must_use]
pub fn merge_windows(mut windows: Vec<CandidateWindow>) -> Vec<CandidateWindow> {
    windows.sort_by_key(|w| w.start);

    let mut merged: Vec<CandidateWindow> = Vec::new();
    for window in windows {
        match merged.last_mut() {
            Some(last) if window.start <= last.end => {
                last.end = last.end.max(window.end);
                last.distance = last.distance.min(window.distance);
            }
            _ => merged.push(window),
        }
    }
    merged
}

#[must_use]
pub fn backing_file(window: &CandidateWindow) -> &str {
    if matches!(window.source_type.as_str(), "YOUTUBE_TRANSCRIPTION" | "LOCAL_AUDIO_FILE")
        && let Some(path) = window.transcription_path.as_deref()
    {
        path
    } else {
        window.source.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(start: usize, end: usize, distance: f32) -> CandidateWindow {
        CandidateWindow { start, end, distance, source: "a.txt".to_string(), source_type: "LOCAL_TEXT_FILE".to_string(), transcription_path: None }
    }

    #[test]
    fn merge_combines_overlapping_runs_and_keeps_min_distance() {
        let merged = merge_windows(vec![window(0, 10, 0.5), window(8, 20, 0.1), window(30, 40, 0.9)]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].start, 0);
        assert_eq!(merged[0].end, 20);
        assert_eq!(merged[0].distance, 0.1);
        assert_eq!(merged[1].start, 30);
    }

    #[test]
    fn merge_does_not_fold_min_distance_into_the_end_expression() {
        // A later, narrower-but-closer window must not lose its min distance
        // just because its end is smaller than the running max.
        let merged = merge_windows(vec![window(0, 100, 1.0), window(10, 20, 0.01)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].end, 100);
        assert_eq!(merged[0].distance, 0.01);
    }

    #[test]
    fn backing_file_prefers_transcription_path_for_audio_sources() {
        let mut w = window(0, 10, 0.1);
        w.source_type = "LOCAL_AUDIO_FILE".to_string();
        w.transcription_path = Some("audio_transcriptions/abc.txt".to_string());
        assert_eq!(backing_file(&w), "audio_transcriptions/abc.txt");
    }

    #[test]
    fn backing_file_falls_back_to_source_for_text_files() {
        let w = window(0, 10, 0.1);
        assert_eq!(backing_file(&w), "a.txt");
    }
}
