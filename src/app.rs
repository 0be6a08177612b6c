/// The application name
pub const NAME: &str = "gcplog";

/// The application version
pub const VERSION: &str = env!("BUILD_VERSION");

lazy_static! {
    static ref LONG_VERSION: String = {
        [
            env!("CARGO_PKG_VERSION").to_string(),
            format!(" - Git version:\t{}", VERSION),
            format!(" - googlelog:\tv{}", googlelog::VERSION),
            format!(" - OS/Arch:\t{}/{}", std::env::consts::OS, std::env::consts::ARCH),
            format!(" - Debug:\t{}", cfg!(debug_assertions)),
        ]
        .join("\n")
    };
}

pub fn long_version() -> &'static str {
    (*LONG_VERSION).as_str()
}
