/// Application name used for directory names and environment variable prefixes.
pub const APP_NAME: &str = "partcraft";

/// Default project file name looked up in the current directory.
pub const PROJECT_FILENAME: &str = "partcraft.yaml";

/// Generic environment prefix shared by every craft application.
pub const CRAFT_ENV_PREFIX: &str = "CRAFT";

/// Length of the truncated part-definition hash stored in step state.
pub const PART_HASH_PREFIX_LEN: usize = 20;
