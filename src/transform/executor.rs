//! Runs a parsed pipeline over the source bytes.

use std::sync::Arc;

use bytes::Bytes;
use mama_av::FrameExtractor;

use super::error::{Result, TransformError};
use super::imaging;
use super::operation::{OperationKind, TransformOperation};
use super::source::SourceFile;

/// Progress of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    /// Executing the stage at this index.
    Running(usize),
    Done,
    /// The stage at this index failed; later stages did not run.
    Failed(usize),
}

/// Executes pipelines. Holds no per-request state and never touches the cache.
#[derive(Clone)]
pub struct Executor {
    frames: Arc<dyn FrameExtractor>,
}

impl Executor {
    pub fn new(frames: Arc<dyn FrameExtractor>) -> Self {
        Self { frames }
    }

    /// Run `operations` in order, each consuming the previous stage's output.
    pub fn run(&self, source: &SourceFile, operations: &[TransformOperation]) -> Result<Bytes> {
        let mut run = PipelineRun::new(self, source);
        run.execute(operations)
    }

    /// Run one stage on `input`, the previous stage's output. The first
    /// stage gets `None` and reads the source only if it needs its bytes.
    pub fn run_stage(
        &self,
        source: &SourceFile,
        op: &TransformOperation,
        input: Option<Bytes>,
    ) -> Result<Bytes> {
        tracing::info!(
            "Running {} on {:?}: w={} h={} format={} quality={}",
            op.kind,
            source.path(),
            op.width,
            op.height,
            op.format,
            op.quality
        );

        match op.kind {
            OperationKind::Resize | OperationKind::Thumbnail if op.is_unsized() => {
                tracing::warn!("{} without width or height, passing input through", op.kind);
                stage_input(source, input)
            }
            OperationKind::Resize => {
                let img = imaging::decode(&stage_input(source, input)?)?;
                let img = imaging::resize(img, op.width, op.height);
                Ok(imaging::encode(&img, op.format, op.quality)?.into())
            }
            OperationKind::Thumbnail => {
                let img = imaging::decode(&stage_input(source, input)?)?;
                let img = imaging::thumbnail(img, op.width, op.height);
                Ok(imaging::encode(&img, op.format, op.quality)?.into())
            }
            OperationKind::Snapshot => {
                // Always reads the video on disk, whatever the previous stage produced.
                let frame = self.frames.extract_frame(source.path(), op.frame_number)?;
                let img = imaging::decode(&frame)?;
                Ok(imaging::encode(&img, op.format, op.quality)?.into())
            }
        }
    }
}

fn stage_input(source: &SourceFile, input: Option<Bytes>) -> Result<Bytes> {
    match input {
        Some(bytes) => Ok(bytes),
        None => Ok(source.load()?.bytes.clone()),
    }
}

/// One execution of a pipeline, tracking its state.
pub struct PipelineRun<'a> {
    executor: &'a Executor,
    source: &'a SourceFile,
    state: PipelineState,
}

impl<'a> PipelineRun<'a> {
    pub fn new(executor: &'a Executor, source: &'a SourceFile) -> Self {
        Self {
            executor,
            source,
            state: PipelineState::Init,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Drive the pipeline to `Done` or `Failed`.
    pub fn execute(&mut self, operations: &[TransformOperation]) -> Result<Bytes> {
        let mut current: Option<Bytes> = None;

        for (index, op) in operations.iter().enumerate() {
            self.state = PipelineState::Running(index);
            match self.executor.run_stage(self.source, op, current.take()) {
                Ok(output) => current = Some(output),
                Err(e) => {
                    tracing::error!(
                        "Stage {} ({}) failed for {:?}: {}",
                        index,
                        op.kind,
                        self.source.path(),
                        e
                    );
                    self.state = PipelineState::Failed(index);
                    return Err(e);
                }
            }
        }

        match current {
            Some(output) if !output.is_empty() => {
                self.state = PipelineState::Done;
                Ok(output)
            }
            _ => {
                self.state = PipelineState::Failed(operations.len().saturating_sub(1));
                Err(TransformError::EmptyResult)
            }
        }
    }
}
