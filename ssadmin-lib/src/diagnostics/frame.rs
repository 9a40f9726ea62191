use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::Path;

/// Name of the source directory that holds the controller layer
pub const CONTROLLER_DIR: &str = "controllers";

/// One call site on the way from a controller to the transport.
///
/// Frames are recorded explicitly by the call sites, usually with the
/// [`frame!`](crate::frame) macro, instead of being recovered from the
/// runtime stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    file: Cow<'static, str>,
    function: Cow<'static, str>,
    controller: bool,
}

impl Frame {
    /// Create a frame for `function` defined in the source file `file`
    #[must_use]
    pub fn new(file: impl Into<Cow<'static, str>>, function: impl Into<Cow<'static, str>>) -> Self {
        Self {
            file: file.into(),
            function: function.into(),
            controller: false,
        }
    }

    /// Create a frame which belongs to the controller layer regardless of
    /// where its source file lives
    #[must_use]
    pub fn controller(
        file: impl Into<Cow<'static, str>>,
        function: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            controller: true,
            ..Self::new(file, function)
        }
    }

    /// Path of the source file
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Name of the function
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Last component of the source file path
    #[must_use]
    pub fn file_name(&self) -> &str {
        Path::new(&*self.file)
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap_or(&self.file[..])
    }

    /// A frame is part of the controller layer if it was marked as such or
    /// if the last directory of its source file is [`CONTROLLER_DIR`]
    #[must_use]
    pub fn is_controller(&self) -> bool {
        self.controller
            || Path::new(&*self.file)
                .parent()
                .and_then(Path::file_name)
                .is_some_and(|dir| dir == CONTROLLER_DIR)
    }

    /// `<file name>:<function>`, used in diagnostics
    #[must_use]
    pub fn identifier(&self) -> String {
        format!("{}:{}", self.file_name(), self.function)
    }
}

/// Create a [`Frame`] for the current source file.
///
/// `frame!("add_member")` records a regular frame,
/// `frame!(controller "add_member")` one marked as controller.
#[macro_export]
macro_rules! frame {
    (controller $function:expr) => {
        $crate::diagnostics::Frame::controller(file!(), $function)
    };
    ($function:expr) => {
        $crate::diagnostics::Frame::new(file!(), $function)
    };
}

/// The frames of a call chain, innermost first.
///
/// Each layer calls [`CallStack::enter`] with its own frame before it hands
/// the stack down, so the frame closest to the transport ends up first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallStack {
    frames: Vec<Frame>,
}

impl CallStack {
    /// Create an empty stack
    #[must_use]
    pub const fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// A copy of this stack with `frame` as its new innermost frame
    #[must_use]
    pub fn enter(&self, frame: Frame) -> Self {
        let mut frames = Vec::with_capacity(self.frames.len() + 1);
        frames.push(frame);
        frames.extend(self.frames.iter().cloned());
        Self { frames }
    }

    /// The frames, innermost first
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of frames
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if no frame was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl From<Vec<Frame>> for CallStack {
    /// The frames are expected innermost first
    fn from(frames: Vec<Frame>) -> Self {
        Self { frames }
    }
}

impl AsRef<[Frame]> for CallStack {
    fn as_ref(&self) -> &[Frame] {
        &self.frames
    }
}
