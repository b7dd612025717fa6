//! Default admission rules, tuned for the UCI information and computer science crawl

/// Hosts the crawl is allowed to visit
pub const ALLOWED_DOMAINS: &[&str] = &[
    "*.ics.uci.edu",
    "*.cs.uci.edu",
    "*.informatics.uci.edu",
    "*.stat.uci.edu",
];

/// Hosts that are inside the allow-list but generate thousands of boilerplate pages
pub const DENIED_DOMAINS: &[&str] = &["gitlab"];

/// Query keys that multiply one page into endless variants
///
/// A trailing `*` matches every key with that prefix. Keys with an uppercase
/// letter match case-sensitively (Apache's `C`/`O` directory sort keys).
pub const TRAP_QUERY_KEYS: &[&str] = &[
    "replytocom",
    "share",
    "tab_files",
    "tab_details",
    "action",
    "C",
    "O",
    "filter[*",
];

pub const TRAP_QUERY_PAIRS: &[&str] = &[
    "do=media",
    "do=revisions",
    "do=backlink",
    "do=recent",
    "do=index",
    "format=xml",
];

pub const TRAP_QUERY_SUBSTRINGS: &[&str] = &["oembed"];

pub const DENIED_PATH_SEGMENTS: &[&str] = &["feed"];

pub const DENIED_PATH_SUBSTRINGS: &[&str] = &["/wp-json/", "/wp-content/uploads/"];

/// Extensions of resources that carry no crawlable HTML
pub const DENIED_EXTENSIONS: &[&str] = &[
    // Web assets and images
    "css", "js", "bmp", "gif", "jpg", "jpeg", "ico", "png", "tif", "tiff", "svg", "webp",
    // Media
    "mid", "mp2", "mp3", "mp4", "wav", "avi", "mov", "mpeg", "ram", "m4v", "mkv", "ogg", "ogv",
    "wmv", "swf", "wma", "rm", "smil",
    // Documents
    "pdf", "ps", "eps", "tex", "ppt", "pptx", "ppsx", "doc", "docx", "xls", "xlsx", "rtf", "epub",
    "thmx", "mso", "odc",
    // Archives
    "zip", "rar", "gz", "bz2", "tar", "7z", "tgz", "jar", "war",
    // Binaries and disk images
    "exe", "msi", "bin", "dll", "dmg", "iso", "apk", "img",
    // Source code
    "c", "cc", "cpp", "h", "hpp", "java", "py", "r", "m", "mat", "o",
    // Data
    "names", "data", "dat", "psd", "cnf", "sha1", "arff", "csv", "sql", "db", "lif", "xml",
];

pub const CALENDAR_KEYWORDS: &[&str] = &["calendar", "date", "event"];

pub const AUTH_PATTERNS: &[&str] = &["login", "logout", "wp-admin", "wp-login"];

pub const MAX_URL_LENGTH: usize = 200;

pub const MAX_PATH_DEPTH: usize = 10;

/// Converts a rule table into owned strings for the config layer
pub fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
