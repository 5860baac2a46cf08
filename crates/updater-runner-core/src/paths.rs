//! Fixed repository layout and updater property names.

/// Parent of the registry, queue and history folders.
pub const UPDATE_ROOT: &str = "/hippo:configuration/hippo:update";
/// Folder holding every known updater definition.
pub const REGISTRY_PATH: &str = "/hippo:configuration/hippo:update/hippo:registry";
/// Folder the repository executes updaters from.
pub const QUEUE_PATH: &str = "/hippo:configuration/hippo:update/hippo:queue";
/// Folder the repository moves finished updaters to.
pub const HISTORY_PATH: &str = "/hippo:configuration/hippo:update/hippo:history";

/// XPath statement listing every updater definition in the registry.
pub const REGISTRY_QUERY: &str =
    "/jcr:root/hippo:configuration/hippo:update/hippo:registry//element(*,hipposys:updaterinfo)";

/// Node type of an updater definition.
pub const UPDATER_INFO_TYPE: &str = "hipposys:updaterinfo";

/// Visitor path property.
pub const PROP_PATH: &str = "hipposys:path";
/// Visitor query property.
pub const PROP_QUERY: &str = "hipposys:query";
/// Batch size property.
pub const PROP_BATCH_SIZE: &str = "hipposys:batchsize";
/// Throttle property, in milliseconds.
pub const PROP_THROTTLE: &str = "hipposys:throttle";
/// Dry-run flag written on queued copies.
pub const PROP_DRY_RUN: &str = "hipposys:dryrun";
/// User recorded as the starter of a queued copy.
pub const PROP_STARTED_BY: &str = "hipposys:startedby";

/// Batch size applied when the property is absent.
pub const DEFAULT_BATCH_SIZE: i64 = 10;
/// Throttle applied when the property is absent.
pub const DEFAULT_THROTTLE_MS: i64 = 1000;

/// Queue location for an activation identifier.
#[must_use]
pub fn queue_entry(identifier: &str) -> String {
    format!("{QUEUE_PATH}/{identifier}")
}

/// History location for an activation identifier.
#[must_use]
pub fn history_entry(identifier: &str) -> String {
    format!("{HISTORY_PATH}/{identifier}")
}
