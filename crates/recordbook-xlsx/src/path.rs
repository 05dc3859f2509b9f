//! Part-name arithmetic for relationship targets.

/// The relationships part that belongs to `part`, e.g. `xl/workbook.xml` ->
/// `xl/_rels/workbook.xml.rels`.
pub fn rels_for_part(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file_name)) => format!("{dir}/_rels/{file_name}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship `target` found in the rels of `source_part` to an archive part name.
///
/// `source_part` is the part the relationships describe (empty for the package root).
pub fn resolve_target(source_part: &str, target: &str) -> String {
    let target = target.split('#').next().unwrap_or(target);
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize(absolute);
    }
    let base_dir = source_part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    normalize(&format!("{base_dir}/{target}"))
}

fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
