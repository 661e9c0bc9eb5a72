use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub(crate) fn stable_pair<T: Hash + ?Sized>(key: &T) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

/// Short label for a source path: known prefixes and the extension are dropped.
pub(crate) fn short_path_label(path: &str) -> String {
    const KNOWN_PREFIXES: [&str; 5] = ["./", "/", "src/", "lib/", "app/"];

    let mut trimmed = path.trim().replace('\\', "/");
    loop {
        let Some(prefix) = KNOWN_PREFIXES
            .iter()
            .find(|prefix| trimmed.starts_with(**prefix))
        else {
            break;
        };
        trimmed = trimmed[prefix.len()..].to_owned();
    }

    let file_start = trimmed.rfind('/').map(|index| index + 1).unwrap_or(0);
    if let Some(dot) = trimmed[file_start..].rfind('.')
        && dot > 0
    {
        trimmed.truncate(file_start + dot);
    }
    trimmed
}
