use regex::Regex;

// Reduces a dataset directory name to the query string sent to the taxonomy
// search. Known lossy heuristic carried over from the dataset this was built
// for: the noise substrings are stripped anywhere they occur, and names with
// more than two remaining parts keep only the first and last part. Cache keys
// and query strings downstream depend on this exact behavior.
pub fn normalize(raw_name: &str) -> String {
    let noise = Regex::new("_sp|_adult|_larva").unwrap();
    let cleaned = noise.replace_all(raw_name, "");
    let parts: Vec<&str> = cleaned.split('_').collect();
    if parts.len() > 1 {
        format!("{}+{}", parts[0], parts[parts.len() - 1])
    } else {
        parts[0].to_string()
    }
}
