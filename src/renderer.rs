//! Renderer pipeline pieces: the renderer trait with its dummy, software
//! and GL stages, the recording proxy, and the video-log transports.

use crate::memmap::{GBA_VIDEO_HORIZONTAL_PIXELS, GBA_VIDEO_VERTICAL_PIXELS};
use crate::vlp::VideoLogContext;

pub const RENDERER_DUMMY: u32 = 0;
pub const RENDERER_SOFTWARE: u32 = 1;
#[cfg(feature = "opengl")]
pub const RENDERER_GL: u32 = 2;

/// A renderer installed in the video unit. Stages are owned; a proxy stage
/// consumes the stage below it, so a chain can never dangle.
pub trait VideoRenderer {
    fn renderer_id(&self) -> u32;

    /// Type tag recorded into save-state extra data.
    fn type_tag(&self) -> u32 {
        self.renderer_id()
    }

    fn reset(&mut self) {}

    /// Backdrop color (RGB555) for scanlines nothing else covers.
    fn set_backdrop(&mut self, _rgb555: u16) {}

    fn draw_scanline(&mut self, _y: u16) {}

    fn finish_frame(&mut self) {}

    fn get_pixels(&self) -> Option<(&[u32], usize)> {
        None
    }

    fn put_pixels(&mut self, _pixels: &[u32], _stride: usize) {}

    fn set_layer_enabled(&mut self, _layer: usize, _enable: bool) {}

    fn adjust_layer(&mut self, _layer: usize, _x: i32, _y: i32) {}

    fn scale(&self) -> u32 {
        1
    }

    /// Push a new integer scale factor. Only the GPU stage renders scaled;
    /// everything else ignores this.
    fn set_scale(&mut self, _scale: u32) {}

    fn save_state(&self) -> Vec<u8> {
        Vec::new()
    }

    fn load_state(&mut self, _state: &[u8]) -> bool {
        true
    }

    /// Rebuild support: a plain stage is replaced by the freshly built
    /// chain; a recording proxy adopts it as its new inner stage instead,
    /// keeping the log open across a reset.
    fn reshim(self: Box<Self>, chain: Box<dyn VideoRenderer>) -> Box<dyn VideoRenderer> {
        chain
    }

    fn is_recording(&self) -> bool {
        false
    }

    /// Recording proxies close their log and hand back the wrapped stage.
    fn end_log(&mut self) -> Option<(Box<dyn VideoRenderer>, VideoLogContext)> {
        None
    }
}

/// Installed whenever nothing real is; swallows everything.
#[derive(Default)]
pub struct DummyRenderer;

impl VideoRenderer for DummyRenderer {
    fn renderer_id(&self) -> u32 {
        RENDERER_DUMMY
    }
}

/// Software renderer drawing into an owned pixel buffer.
pub struct SoftwareRenderer {
    buffer: Vec<u32>,
    stride: usize,
    backdrop: u32,
    layer_enabled: [bool; 8],
    layer_offsets: [(i32, i32); 8],
}

impl SoftwareRenderer {
    pub fn new(stride: usize) -> Self {
        let stride = stride.max(GBA_VIDEO_HORIZONTAL_PIXELS as usize);
        Self {
            // Opaque black, matching what reset() restores.
            buffer: vec![0xFF00_0000; stride * GBA_VIDEO_VERTICAL_PIXELS as usize],
            stride,
            backdrop: 0xFF00_0000,
            layer_enabled: [true; 8],
            layer_offsets: [(0, 0); 8],
        }
    }

    fn rgb555_to_argb(color: u16) -> u32 {
        let r = (color as u32 & 0x1F) << 3;
        let g = ((color as u32 >> 5) & 0x1F) << 3;
        let b = ((color as u32 >> 10) & 0x1F) << 3;
        0xFF00_0000 | (r << 16) | (g << 8) | b
    }
}

impl VideoRenderer for SoftwareRenderer {
    fn renderer_id(&self) -> u32 {
        RENDERER_SOFTWARE
    }

    fn reset(&mut self) {
        self.buffer.fill(0xFF00_0000);
    }

    fn set_backdrop(&mut self, rgb555: u16) {
        self.backdrop = Self::rgb555_to_argb(rgb555);
    }

    fn draw_scanline(&mut self, y: u16) {
        let y = y as usize;
        if y >= GBA_VIDEO_VERTICAL_PIXELS as usize {
            return;
        }
        let row = &mut self.buffer[y * self.stride..];
        row[..GBA_VIDEO_HORIZONTAL_PIXELS as usize].fill(self.backdrop);
    }

    fn get_pixels(&self) -> Option<(&[u32], usize)> {
        Some((&self.buffer, self.stride))
    }

    fn put_pixels(&mut self, pixels: &[u32], stride: usize) {
        let rows = GBA_VIDEO_VERTICAL_PIXELS as usize;
        let cols = GBA_VIDEO_HORIZONTAL_PIXELS as usize;
        for y in 0..rows {
            let Some(src) = pixels.get(y * stride..y * stride + cols) else {
                break;
            };
            self.buffer[y * self.stride..y * self.stride + cols].copy_from_slice(src);
        }
    }

    fn set_layer_enabled(&mut self, layer: usize, enable: bool) {
        if let Some(slot) = self.layer_enabled.get_mut(layer) {
            *slot = enable;
        }
    }

    fn adjust_layer(&mut self, layer: usize, x: i32, y: i32) {
        if let Some(slot) = self.layer_offsets.get_mut(layer) {
            *slot = (x, y);
        }
    }

    fn save_state(&self) -> Vec<u8> {
        let mut state = Vec::with_capacity(8);
        for enabled in self.layer_enabled {
            state.push(enabled as u8);
        }
        state
    }

    fn load_state(&mut self, state: &[u8]) -> bool {
        if state.len() < 8 {
            return false;
        }
        for (slot, &byte) in self.layer_enabled.iter_mut().zip(state) {
            *slot = byte != 0;
        }
        true
    }
}

/// Hardware-accelerated stage; holds the front-end's texture handle and
/// renders at an integer scale factor.
#[cfg(feature = "opengl")]
pub struct GlRenderer {
    pub tex: u32,
    pub scale: u32,
}

#[cfg(feature = "opengl")]
impl GlRenderer {
    pub fn new(tex: u32, scale: u32) -> Self {
        Self {
            tex,
            scale: scale.max(1),
        }
    }
}

#[cfg(feature = "opengl")]
impl VideoRenderer for GlRenderer {
    fn renderer_id(&self) -> u32 {
        RENDERER_GL
    }

    fn scale(&self) -> u32 {
        self.scale
    }

    fn set_scale(&mut self, scale: u32) {
        self.scale = scale.max(1);
    }
}

/// One renderer command in a video log stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoggedCommand {
    DrawScanline(u16),
    FinishFrame(u32),
}

/// Sink for a command stream being recorded.
pub trait VideoLogger {
    fn write_command(&mut self, command: LoggedCommand);
    fn flush(&mut self);
    fn finish(self: Box<Self>) -> VideoLogContext;
}

/// In-process recorder assembling commands into per-frame lists.
pub struct ContextRecorder {
    context: VideoLogContext,
    current: Vec<LoggedCommand>,
}

impl ContextRecorder {
    pub fn new(initial_state: Vec<u8>) -> Self {
        Self {
            context: VideoLogContext::new(initial_state),
            current: Vec::new(),
        }
    }
}

impl VideoLogger for ContextRecorder {
    fn write_command(&mut self, command: LoggedCommand) {
        match command {
            LoggedCommand::DrawScanline(_) => self.current.push(command),
            LoggedCommand::FinishFrame(_) => {
                self.current.push(command);
                self.context.frames.push(std::mem::take(&mut self.current));
            }
        }
    }

    fn flush(&mut self) {}

    fn finish(self: Box<Self>) -> VideoLogContext {
        // A partial frame at shutdown is dropped; logs only carry whole
        // frames.
        self.context
    }
}

#[cfg(feature = "threaded-video")]
mod threaded {
    use super::{ContextRecorder, LoggedCommand, VideoLogger};
    use crate::vlp::VideoLogContext;
    use crossbeam_channel::{Receiver, Sender, unbounded};
    use std::thread::JoinHandle;

    enum LogMessage {
        Command(LoggedCommand),
        Flush,
        Shutdown,
    }

    /// Logger transport that moves recording off the emulation thread.
    /// `flush` is a rendezvous: it returns once the worker has drained
    /// every command sent before it.
    pub struct ThreadedLogger {
        sender: Sender<LogMessage>,
        ack: Receiver<()>,
        handle: Option<JoinHandle<VideoLogContext>>,
    }

    impl ThreadedLogger {
        /// Worker that assembles the command stream into a log context.
        pub fn spawn(initial_state: Vec<u8>) -> Self {
            Self::start(Some(initial_state))
        }

        /// Worker that drains and discards. Used by the thread-proxy
        /// pipeline stage, which only wants the decoupling, not a log.
        pub fn pipe() -> Self {
            Self::start(None)
        }

        fn start(record: Option<Vec<u8>>) -> Self {
            let (sender, commands) = unbounded::<LogMessage>();
            let (ack_tx, ack) = unbounded();
            let handle = std::thread::spawn(move || {
                let mut recorder = record.map(|initial| Box::new(ContextRecorder::new(initial)));
                while let Ok(message) = commands.recv() {
                    match message {
                        LogMessage::Command(command) => {
                            if let Some(recorder) = recorder.as_mut() {
                                recorder.write_command(command);
                            }
                        }
                        LogMessage::Flush => {
                            if ack_tx.send(()).is_err() {
                                break;
                            }
                        }
                        LogMessage::Shutdown => break,
                    }
                }
                recorder.map(|recorder| recorder.finish()).unwrap_or_default()
            });
            Self {
                sender,
                ack,
                handle: Some(handle),
            }
        }
    }

    impl VideoLogger for ThreadedLogger {
        fn write_command(&mut self, command: LoggedCommand) {
            let _ = self.sender.send(LogMessage::Command(command));
        }

        fn flush(&mut self) {
            if self.sender.send(LogMessage::Flush).is_ok() {
                let _ = self.ack.recv();
            }
        }

        fn finish(mut self: Box<Self>) -> VideoLogContext {
            let _ = self.sender.send(LogMessage::Shutdown);
            self.handle
                .take()
                .and_then(|handle| handle.join().ok())
                .unwrap_or_default()
        }
    }

    impl Drop for ThreadedLogger {
        fn drop(&mut self) {
            if let Some(handle) = self.handle.take() {
                let _ = self.sender.send(LogMessage::Shutdown);
                let _ = handle.join();
            }
        }
    }
}

#[cfg(feature = "threaded-video")]
pub use threaded::ThreadedLogger;

/// Proxy stage: forwards everything to the wrapped renderer while
/// mirroring the command stream into a logger.
///
/// A recording proxy is feeding an open video log and survives pipeline
/// rebuilds; a pipe proxy merely decouples the command stream and is torn
/// down and respawned with the chain.
pub struct ProxyRenderer {
    inner: Box<dyn VideoRenderer>,
    logger: Option<Box<dyn VideoLogger>>,
    recording: bool,
    /// Scanlines between forced flushes. None flushes at frame boundaries
    /// only.
    flush_scanlines: Option<u16>,
    frames_logged: u32,
    scanlines_since_flush: u16,
}

impl ProxyRenderer {
    pub fn new(
        inner: Box<dyn VideoRenderer>,
        logger: Box<dyn VideoLogger>,
        flush_scanlines: Option<u16>,
    ) -> Self {
        Self {
            inner,
            logger: Some(logger),
            recording: true,
            flush_scanlines,
            frames_logged: 0,
            scanlines_since_flush: 0,
        }
    }

    pub fn pipe(
        inner: Box<dyn VideoRenderer>,
        logger: Box<dyn VideoLogger>,
        flush_scanlines: Option<u16>,
    ) -> Self {
        Self {
            inner,
            logger: Some(logger),
            recording: false,
            flush_scanlines,
            frames_logged: 0,
            scanlines_since_flush: 0,
        }
    }
}

impl VideoRenderer for ProxyRenderer {
    fn renderer_id(&self) -> u32 {
        self.inner.renderer_id()
    }

    fn type_tag(&self) -> u32 {
        self.inner.type_tag()
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn set_backdrop(&mut self, rgb555: u16) {
        self.inner.set_backdrop(rgb555);
    }

    fn draw_scanline(&mut self, y: u16) {
        if let Some(logger) = self.logger.as_mut() {
            logger.write_command(LoggedCommand::DrawScanline(y));
            self.scanlines_since_flush += 1;
            if let Some(interval) = self.flush_scanlines
                && self.scanlines_since_flush >= interval
            {
                logger.flush();
                self.scanlines_since_flush = 0;
            }
        }
        self.inner.draw_scanline(y);
    }

    fn finish_frame(&mut self) {
        if let Some(logger) = self.logger.as_mut() {
            logger.write_command(LoggedCommand::FinishFrame(self.frames_logged));
            logger.flush();
            self.frames_logged += 1;
            self.scanlines_since_flush = 0;
        }
        self.inner.finish_frame();
    }

    fn get_pixels(&self) -> Option<(&[u32], usize)> {
        self.inner.get_pixels()
    }

    fn put_pixels(&mut self, pixels: &[u32], stride: usize) {
        self.inner.put_pixels(pixels, stride);
    }

    fn set_layer_enabled(&mut self, layer: usize, enable: bool) {
        self.inner.set_layer_enabled(layer, enable);
    }

    fn adjust_layer(&mut self, layer: usize, x: i32, y: i32) {
        self.inner.adjust_layer(layer, x, y);
    }

    fn scale(&self) -> u32 {
        self.inner.scale()
    }

    fn set_scale(&mut self, scale: u32) {
        self.inner.set_scale(scale);
    }

    fn save_state(&self) -> Vec<u8> {
        self.inner.save_state()
    }

    fn load_state(&mut self, state: &[u8]) -> bool {
        self.inner.load_state(state)
    }

    fn reshim(mut self: Box<Self>, chain: Box<dyn VideoRenderer>) -> Box<dyn VideoRenderer> {
        if self.recording {
            // The open log outlives the rebuild; adopt the fresh chain.
            self.inner = chain;
            self
        } else {
            // A pipe stage is rebuilt with the chain; dropping it drains
            // the worker.
            chain
        }
    }

    fn is_recording(&self) -> bool {
        self.recording && self.logger.is_some()
    }

    fn end_log(&mut self) -> Option<(Box<dyn VideoRenderer>, VideoLogContext)> {
        if !self.recording {
            return None;
        }
        let mut logger = self.logger.take()?;
        logger.flush();
        let context = logger.finish();
        let inner = std::mem::replace(&mut self.inner, Box::new(DummyRenderer));
        Some((inner, context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn software_renderer_fills_backdrop_rows() {
        let mut renderer = SoftwareRenderer::new(256);
        renderer.set_backdrop(0x001F);
        renderer.draw_scanline(3);
        let (pixels, stride) = renderer.get_pixels().unwrap();
        assert_eq!(stride, 256);
        assert_eq!(pixels[3 * 256], 0xFFF8_0000);
        assert_eq!(pixels[3 * 256 + 239], 0xFFF8_0000);
        assert_eq!(pixels[2 * 256], 0xFF00_0000);
    }

    #[test]
    fn proxy_records_frames_and_unshims() {
        let recorder = Box::new(ContextRecorder::new(vec![0xAB]));
        let mut proxy = ProxyRenderer::new(Box::new(SoftwareRenderer::new(240)), recorder, None);
        for y in 0..3u16 {
            proxy.draw_scanline(y);
        }
        proxy.finish_frame();
        proxy.draw_scanline(0);
        proxy.finish_frame();
        let (inner, context) = proxy.end_log().unwrap();
        assert_eq!(inner.renderer_id(), RENDERER_SOFTWARE);
        assert_eq!(context.frames.len(), 2);
        assert_eq!(context.frames[0].len(), 4);
        assert_eq!(context.frames[0][3], LoggedCommand::FinishFrame(0));
        assert_eq!(context.initial_state, vec![0xAB]);
        // Ending twice yields nothing.
        assert!(proxy.end_log().is_none());
    }

    struct CountingLogger {
        flushes: std::rc::Rc<std::cell::Cell<u32>>,
    }

    impl VideoLogger for CountingLogger {
        fn write_command(&mut self, _command: LoggedCommand) {}

        fn flush(&mut self) {
            self.flushes.set(self.flushes.get() + 1);
        }

        fn finish(self: Box<Self>) -> VideoLogContext {
            VideoLogContext::default()
        }
    }

    #[test]
    fn flush_interval_paces_mid_frame_flushes() {
        let flushes = std::rc::Rc::new(std::cell::Cell::new(0));
        let logger = Box::new(CountingLogger {
            flushes: std::rc::Rc::clone(&flushes),
        });
        let mut proxy = ProxyRenderer::pipe(Box::new(DummyRenderer), logger, Some(2));
        for y in 0..5u16 {
            proxy.draw_scanline(y);
        }
        assert_eq!(flushes.get(), 2);
        proxy.finish_frame();
        assert_eq!(flushes.get(), 3);

        // Without an interval, only frame boundaries flush.
        let flushes = std::rc::Rc::new(std::cell::Cell::new(0));
        let logger = Box::new(CountingLogger {
            flushes: std::rc::Rc::clone(&flushes),
        });
        let mut proxy = ProxyRenderer::pipe(Box::new(DummyRenderer), logger, None);
        for y in 0..100u16 {
            proxy.draw_scanline(y);
        }
        assert_eq!(flushes.get(), 0);
        proxy.finish_frame();
        assert_eq!(flushes.get(), 1);
    }

    #[test]
    fn pipe_proxy_is_not_a_recording() {
        let recorder = Box::new(ContextRecorder::new(Vec::new()));
        let mut pipe = ProxyRenderer::pipe(Box::new(SoftwareRenderer::new(240)), recorder, None);
        assert!(!pipe.is_recording());
        assert!(pipe.end_log().is_none());

        // On a rebuild the pipe is dropped in favor of the fresh chain.
        let rebuilt = Box::new(pipe).reshim(Box::new(DummyRenderer));
        assert_eq!(rebuilt.renderer_id(), RENDERER_DUMMY);

        // A recording proxy adopts the chain instead.
        let recorder = Box::new(ContextRecorder::new(Vec::new()));
        let recording =
            ProxyRenderer::new(Box::new(SoftwareRenderer::new(240)), recorder, None);
        let reshimmed = Box::new(recording).reshim(Box::new(DummyRenderer));
        assert!(reshimmed.is_recording());
    }

    #[cfg(feature = "threaded-video")]
    #[test]
    fn threaded_logger_round_trips_commands() {
        let mut logger: Box<dyn VideoLogger> = Box::new(ThreadedLogger::spawn(vec![1, 2]));
        logger.write_command(LoggedCommand::DrawScanline(0));
        logger.write_command(LoggedCommand::FinishFrame(0));
        logger.flush();
        let context = logger.finish();
        assert_eq!(context.initial_state, vec![1, 2]);
        assert_eq!(context.frames.len(), 1);
        assert_eq!(context.frames[0].len(), 2);
    }

    #[cfg(feature = "threaded-video")]
    #[test]
    fn threaded_pipe_discards_its_stream() {
        let mut logger: Box<dyn VideoLogger> = Box::new(ThreadedLogger::pipe());
        logger.write_command(LoggedCommand::DrawScanline(0));
        logger.write_command(LoggedCommand::FinishFrame(0));
        logger.flush();
        let context = logger.finish();
        assert!(context.initial_state.is_empty());
        assert!(context.frames.is_empty());
    }
}
