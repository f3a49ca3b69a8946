/// Project configuration file looked up in the working directory
pub const APIM_BULK_CONFIG: &str = "apim-bulk.yaml";

/// Environment variable overriding the global environments file location
pub const ENVIRONMENTS_PATH_ENV: &str = "APIM_BULK_ENVIRONMENTS_PATH";

/// Global environments file, relative to the user config directory
pub const GLOBAL_ENVIRONMENTS_FILE: &str = "apim-bulk/environments.yaml";

pub const DEFAULT_APICTL: &str = "apictl";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// apictl only lists 25 APIs unless told otherwise
pub const DEFAULT_LIST_LIMIT: u32 = 1000;

pub const ARCHIVE_EXTENSION: &str = "zip";

/// Log files older than this many days are removed by `clean-logs`
pub const DEFAULT_LOG_RETENTION_DAYS: u64 = 30;
