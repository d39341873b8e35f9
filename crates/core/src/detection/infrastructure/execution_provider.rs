use ort::execution_providers::ExecutionProviderDispatch;

/// Execution providers to register on the detector's ONNX session.
///
/// ONNX Runtime silently falls back to CPU when a listed provider cannot be
/// created, so an empty list simply means CPU.
pub fn preferred_execution_providers() -> Vec<ExecutionProviderDispatch> {
    let providers = platform_providers();
    log::debug!(
        "Registering {} accelerated execution provider(s)",
        providers.len()
    );
    providers
}

#[cfg(target_os = "macos")]
fn platform_providers() -> Vec<ExecutionProviderDispatch> {
    vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
}

#[cfg(target_os = "windows")]
fn platform_providers() -> Vec<ExecutionProviderDispatch> {
    vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn platform_providers() -> Vec<ExecutionProviderDispatch> {
    Vec::new()
}
