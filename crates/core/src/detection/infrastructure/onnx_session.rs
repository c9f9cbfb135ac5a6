//! ONNX Runtime session construction shared by the detector and encoder.
use std::path::Path;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;

/// Loads `model_path` with full graph optimization, one inter-op thread and
/// all cores for intra-op work, preferring the platform accelerator.
pub fn build_session(model_path: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    let intra_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    log::debug!(
        "Loading ONNX model {} ({intra_threads} threads)",
        model_path.display()
    );
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_inter_threads(1)?
        .with_intra_threads(intra_threads)?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(model_path)?;
    Ok(session)
}

/// Platform-specific execution providers; ONNX Runtime falls back to CPU
/// when none of them are available.
fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Square NCHW input side declared by the model, if static.
pub fn square_input_size(session: &Session) -> Option<u32> {
    let input = session.inputs().first()?;
    match input.dtype() {
        ort::value::ValueType::Tensor { shape, .. } if shape.len() >= 4 && shape[2] > 0 => {
            Some(shape[2] as u32)
        }
        _ => None,
    }
}
