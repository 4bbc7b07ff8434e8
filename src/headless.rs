use crate::export::{self, GifRecorder};
use crate::host::{Host, SurfaceEvent};
use crate::scene::Scene;
use crate::surface::Surface;
use std::f32::consts::TAU;
use std::path::PathBuf;

/// Fixed time step for offscreen rendering
pub const FRAME_DT: f32 = 1.0 / 60.0;

/// An offscreen render: run a scene for a number of frames and write the results
#[derive(Debug, Clone)]
pub struct HeadlessRun {
    pub frames: usize,
    /// Drive a pointer across the surface along a slow sine path
    pub pointer_sweep: bool,
    pub gif: Option<PathBuf>,
    pub png: Option<PathBuf>,
}

/// What a headless run produced
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessReport {
    pub frames_rendered: usize,
    pub gif_frames: usize,
    pub width: u32,
    pub height: u32,
}

/// Pointer position at `progress` (0..=1) through the sweep
pub fn sweep_position(progress: f32, width: u32, height: u32) -> (f32, f32) {
    let (w, h) = (width as f32, height as f32);
    let x = progress.clamp(0.0, 1.0) * w;
    let y = h / 2.0 + h / 4.0 * (progress * TAU).sin();
    (x, y)
}

impl HeadlessRun {
    pub fn run(&self, scene: &mut Scene) -> Result<HeadlessReport, String> {
        let mut composed = Surface::acquire(0, 0)?;
        let mut recorder: Option<GifRecorder> = None;
        let mut rendered = 0;

        for index in 0..self.frames {
            if self.pointer_sweep {
                let (width, height) = scene.host().surface_size();
                let progress = index as f32 / self.frames.max(1) as f32;
                let (x, y) = sweep_position(progress, width, height);
                scene.deliver(SurfaceEvent::PointerMove { x, y });
            }

            if !scene.tick(FRAME_DT) {
                break;
            }
            scene.compose_into(&mut composed);
            rendered += 1;

            if let Some(path) = &self.gif {
                if recorder.is_none() {
                    recorder = Some(GifRecorder::create(path, composed.width(), composed.height())?);
                }
                if let Some(recorder) = &mut recorder {
                    recorder.offer_frame(composed.image(), FRAME_DT)?;
                }
            }
            log::trace!("frame {} rendered", index);
        }
        if self.pointer_sweep {
            scene.deliver(SurfaceEvent::PointerLeave);
        }
        log::debug!("final background {}", scene.background().css());

        let gif_frames = match recorder {
            Some(recorder) => recorder.finish()?,
            None => 0,
        };
        if let Some(path) = &self.png {
            export::save_png(composed.image(), path)?;
        }

        log::info!("rendered {} frames at {}x{}", rendered, composed.width(), composed.height());
        Ok(HeadlessReport {
            frames_rendered: rendered,
            gif_frames,
            width: composed.width(),
            height: composed.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::professional_palettes;
    use crate::settings::{BackdropMode, FieldSettings};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scene(mode: BackdropMode) -> Scene {
        Scene::mount(
            mode,
            160,
            96,
            &FieldSettings::default(),
            professional_palettes(),
            StdRng::seed_from_u64(4),
        )
        .unwrap()
    }

    #[test]
    fn test_sweep_path() {
        assert_eq!(sweep_position(0.0, 200, 100), (0.0, 50.0));
        let (x, y) = sweep_position(0.25, 200, 100);
        assert!((x - 50.0).abs() < 1e-4);
        assert!((y - 75.0).abs() < 1e-4);
    }

    #[test]
    fn test_headless_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let run = HeadlessRun {
            frames: 30,
            pointer_sweep: true,
            gif: Some(dir.path().join("out.gif")),
            png: Some(dir.path().join("out.png")),
        };
        let mut scene = scene(BackdropMode::Professional);
        let report = run.run(&mut scene).unwrap();

        assert_eq!(report.frames_rendered, 30);
        assert_eq!((report.width, report.height), (160, 96));
        assert!(report.gif_frames >= 9 && report.gif_frames <= 11);
        assert!(dir.path().join("out.gif").exists());
        assert!(dir.path().join("out.png").exists());
    }

    #[test]
    fn test_headless_without_outputs() {
        let run = HeadlessRun {
            frames: 5,
            pointer_sweep: false,
            gif: None,
            png: None,
        };
        let mut scene = scene(BackdropMode::Interactive);
        let report = run.run(&mut scene).unwrap();
        assert_eq!(report.frames_rendered, 5);
        assert_eq!(report.gif_frames, 0);
    }

    #[test]
    fn test_torn_down_scene_renders_nothing() {
        let run = HeadlessRun {
            frames: 5,
            pointer_sweep: false,
            gif: None,
            png: None,
        };
        let mut scene = scene(BackdropMode::Morphing);
        scene.teardown();
        assert_eq!(run.run(&mut scene).unwrap().frames_rendered, 0);
    }
}
