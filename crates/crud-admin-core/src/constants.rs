// ABOUTME: Application-wide constants for the admin panel
// ABOUTME: Naming conventions, default routes, table names, and limits

//! Constants grouped by concern.

/// Column naming conventions
pub mod columns {
    /// Columns whose name contains this marker store a hashed secret
    pub const HASH_SUFFIX: &str = "_hash";
    /// Literal the edit form sends for empty optional values
    pub const NONE_LITERAL: &str = "None";
}

/// Defaults used when the environment does not say otherwise
pub mod defaults {
    /// Admin panel display name
    pub const PANEL_NAME: &str = "Admin Panel";
    /// URL prefix the admin panel is mounted under
    pub const ROUTE: &str = "/admin";
    /// Folder scanned for preset YAML files
    pub const PRESETS_FOLDER: &str = "presets";
    /// Table storing the change history
    pub const HISTORY_TABLE: &str = "crud_admin_history";
    /// Rows per page in table views
    pub const PAGE_SIZE: u32 = 50;
    /// Rows per page in the history view
    pub const HISTORY_PAGE_SIZE: u32 = 100;
    /// Session token lifetime
    pub const TOKEN_EXPIRY_HOURS: u64 = 24;
    /// Username used when the panel runs in debug mode
    pub const DEBUG_USER: &str = "debug";
    /// Fallback admin user in development
    pub const DEV_ADMIN_USER: &str = "admin";
    /// Fallback admin password in development
    pub const DEV_ADMIN_PASSWORD: &str = "1234";
    /// HTTP listen port
    pub const HTTP_PORT: u16 = 5000;
    /// HTTP listen host
    pub const HOST: &str = "0.0.0.0";
    /// Database URL
    pub const DATABASE_URL: &str = "sqlite:./data/admin.db";
    /// Upload size limit in bytes
    pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
}

/// Authentication constants
pub mod auth {
    /// Cookie holding the session JWT
    pub const SESSION_COOKIE: &str = "admin_token";
    /// JWT audience claim
    pub const TOKEN_AUDIENCE: &str = "crud-admin";
    /// Length of generated JWT secrets
    pub const GENERATED_SECRET_LEN: usize = 64;
}

/// Service identity used in logs
pub mod service_names {
    /// Service name for structured logging
    pub const CRUD_ADMIN: &str = "crud-admin";
}
