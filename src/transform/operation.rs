//! Operation registry and pipeline stages.

use super::format::ImageFormat;

/// Default encoder quality.
pub const DEFAULT_QUALITY: u32 = 95;

/// The closed set of operations a stage can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Aspect-preserving downscale to fit a box.
    Resize,
    /// Downscale and crop to fill a box exactly.
    Thumbnail,
    /// Extract one frame of a video.
    Snapshot,
}

impl OperationKind {
    /// Look up an operation by its query name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "resize" => Some(Self::Resize),
            "thumbnail" => Some(Self::Thumbnail),
            "snapshot" => Some(Self::Snapshot),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Resize => "resize",
            Self::Thumbnail => "thumbnail",
            Self::Snapshot => "snapshot",
        }
    }

    /// Whether serving the untransformed source is an acceptable outcome when
    /// this operation fails.
    ///
    /// Informational: the transformer falls back on every failure.
    pub fn can_fallback(&self) -> bool {
        match self {
            Self::Resize | Self::Thumbnail => true,
            Self::Snapshot => false,
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One pipeline stage with all defaults resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOperation {
    pub kind: OperationKind,
    /// Target width, `0` when unspecified.
    pub width: u32,
    /// Target height, `0` when unspecified.
    pub height: u32,
    pub quality: u32,
    pub format: ImageFormat,
    /// Frame to extract, only meaningful for snapshots.
    pub frame_number: u32,
}

impl TransformOperation {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            width: 0,
            height: 0,
            quality: DEFAULT_QUALITY,
            format: ImageFormat::default(),
            frame_number: 0,
        }
    }

    /// Canonical description of this stage, used to build cache keys.
    ///
    /// Fields are listed in name order and zero values are left out, so two
    /// stages that behave the same describe themselves the same way.
    pub fn descriptor(&self) -> String {
        let mut pairs: Vec<(&str, String)> = vec![
            ("format", self.format.name().to_string()),
            ("op", self.kind.name().to_string()),
        ];
        for (key, value) in [
            ("framenum", self.frame_number),
            ("h", self.height),
            ("quality", self.quality),
            ("w", self.width),
        ] {
            if value != 0 {
                pairs.push((key, value.to_string()));
            }
        }
        pairs.sort_by(|a, b| a.0.cmp(b.0));

        pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Whether the stage names no target size at all.
    pub fn is_unsized(&self) -> bool {
        self.width == 0 && self.height == 0
    }
}
