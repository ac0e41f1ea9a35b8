//! Service id composition.
//!
//! A service id may carry the id of the application it belongs to and the id of the
//! application instance, e.g. `receiver@app@2`. Several instances of one logical service
//! can then be deployed side by side on one device.

/// Separates the base service id, the application id and the application instance id.
pub const APPLICATION_SEPARATOR: char = '@';

/// Composes a service id from its parts. Empty parts are left out.
pub fn compose_id(service: &str, application: &str, instance: &str) -> String {
    let mut result = service.to_string();
    if !application.is_empty() || !instance.is_empty() {
        result.push(APPLICATION_SEPARATOR);
        result.push_str(application);
    }
    if !instance.is_empty() {
        result.push(APPLICATION_SEPARATOR);
        result.push_str(instance);
    }
    result
}

/// Returns the base service id, i.e. `id` without application and instance parts.
pub fn base_id(id: &str) -> &str {
    id.split(APPLICATION_SEPARATOR).next().unwrap_or(id)
}

/// Returns the application id part of `id`, empty if there is none.
pub fn application_id(id: &str) -> &str {
    id.split(APPLICATION_SEPARATOR).nth(1).unwrap_or("")
}

/// Returns the application instance id part of `id`, empty if there is none.
pub fn application_instance_id(id: &str) -> &str {
    id.split(APPLICATION_SEPARATOR).nth(2).unwrap_or("")
}

/// Whether `a` and `b` denote the same logical service, ignoring the instance part.
pub fn same_logical_service(a: &str, b: &str) -> bool {
    base_id(a) == base_id(b) && application_id(a) == application_id(b)
}
