/// Plain-text listing of raw download URLs, one block per file:
///
/// ```text
/// alice.yaml:
/// https://gist.githubusercontent.com/{owner}/{gist_id}/raw/alice.yaml
///
/// ```
///
/// Filenames are sorted, so the listing does not depend on client order.
pub fn build_index<S: AsRef<str>>(
    filenames: &[S],
    raw_base: &str,
    owner: &str,
    gist_id: &str,
) -> String {
    let mut sorted: Vec<&str> = filenames.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();

    let base = raw_base.trim_end_matches('/');
    let mut lines = Vec::with_capacity(sorted.len() * 3);
    for filename in sorted {
        lines.push(format!("{filename}:"));
        lines.push(format!("{base}/{owner}/{gist_id}/raw/{filename}"));
        lines.push(String::new());
    }
    lines.join("\n")
}
