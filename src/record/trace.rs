use std::backtrace::Backtrace;

/// Capture a synthetic stack trace at the call site, keeping at most `limit`
/// frames. The limit is an explicit parameter so no global trace settings are
/// mutated.
pub fn capture_stack(limit: usize) -> String {
    let backtrace = Backtrace::force_capture();
    truncate_frames(&backtrace.to_string(), limit)
}

/// Keep the first `limit` frames of a rendered backtrace. Frame headers are
/// lines of the form `N: symbol`; their following `at file:line` lines are
/// kept with them.
fn truncate_frames(rendered: &str, limit: usize) -> String {
    let mut frames = 0usize;
    let mut kept = Vec::new();

    for line in rendered.lines() {
        if is_frame_header(line) {
            frames += 1;
            if frames > limit {
                break;
            }
        }
        kept.push(line);
    }

    kept.join("\n")
}

fn is_frame_header(line: &str) -> bool {
    let trimmed = line.trim_start();
    let Some((index, _)) = trimmed.split_once(": ") else {
        return false;
    };
    !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit())
}
