mod metadata;
mod requirements;
mod runtime;
mod version;

pub use metadata::{
    parse_key_values, MetadataError, MetadataField, PackageMetadata, RuntimeVersionSource,
    DEFAULT_ENTRY_FILE,
};
pub use requirements::{detect_runtime_pin, is_runtime_pin, DependencySpecList};
pub use runtime::{
    parse_interpreter_version, pth_file_name, render_pth_template, runtime_stem, RuntimeSource,
    DEFAULT_BOOTSTRAP_URL, DEFAULT_RUNTIME_BASE_URL, DEFAULT_RUNTIME_PLATFORM, INTERPRETER_EXE,
};
pub use version::{compare_versions, DottedVersion, VersionOrdering};

#[cfg(test)]
mod tests;
