//! Recorded render commands and their compilation into scene passes.

use glam::{Mat4, Vec4};

use crate::engine::error::{EngineError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand<D> {
    SetClearColor(Vec4),
    Clear,
    BeginScene { view_projection: Mat4 },
    DrawIndexed(D),
    EndScene,
}

/// One render pass worth of draws sharing a view-projection matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenePass<D> {
    /// Color to clear to before drawing; `None` keeps the previous contents.
    pub clear: Option<Vec4>,
    pub view_projection: Mat4,
    pub draws: Vec<D>,
}

/// Per-frame command list. Sequencing is validated as commands are pushed:
/// draws and clears only between `BeginScene`/`EndScene` and outside of
/// one respectively, and scenes never nest.
#[derive(Debug)]
pub struct CommandQueue<D> {
    commands: Vec<RenderCommand<D>>,
    clear_color: Vec4,
    /// Clear color in effect when the current frame started recording.
    frame_clear_color: Vec4,
    in_scene: bool,
}

impl<D> Default for CommandQueue<D> {
    fn default() -> Self {
        let clear_color = Vec4::new(0.1, 0.1, 0.1, 1.0);
        Self {
            commands: Vec::new(),
            clear_color,
            frame_clear_color: clear_color,
            in_scene: false,
        }
    }
}

impl<D> CommandQueue<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: RenderCommand<D>) -> Result<()> {
        match &command {
            RenderCommand::BeginScene { .. } if self.in_scene => {
                return Err(EngineError::RenderQueue("begin_scene called inside a scene".into()));
            }
            RenderCommand::BeginScene { .. } => self.in_scene = true,
            RenderCommand::EndScene if !self.in_scene => {
                return Err(EngineError::RenderQueue("end_scene called without begin_scene".into()));
            }
            RenderCommand::EndScene => self.in_scene = false,
            RenderCommand::DrawIndexed(_) if !self.in_scene => {
                return Err(EngineError::RenderQueue("draw submitted outside of a scene".into()));
            }
            RenderCommand::Clear if self.in_scene => {
                return Err(EngineError::RenderQueue("clear issued inside a scene".into()));
            }
            RenderCommand::SetClearColor(color) => self.clear_color = *color,
            _ => (),
        }
        self.commands.push(command);
        Ok(())
    }

    pub fn in_scene(&self) -> bool {
        self.in_scene
    }

    pub fn clear_color(&self) -> Vec4 {
        self.clear_color
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drains the frame's commands into passes. A trailing `Clear` with no
    /// scene after it still produces an (empty) pass so the target is
    /// cleared. An unterminated scene is an error and the frame is dropped.
    pub fn compile(&mut self) -> Result<Vec<ScenePass<D>>> {
        if self.in_scene {
            self.in_scene = false;
            self.commands.clear();
            self.frame_clear_color = self.clear_color;
            return Err(EngineError::RenderQueue("scene was not ended before flush".into()));
        }

        let mut passes = Vec::new();
        let mut clear_color = self.frame_clear_color;
        let mut pending_clear = None;
        let mut current: Option<ScenePass<D>> = None;

        for command in self.commands.drain(..) {
            match command {
                RenderCommand::SetClearColor(color) => clear_color = color,
                RenderCommand::Clear => pending_clear = Some(clear_color),
                RenderCommand::BeginScene { view_projection } => {
                    current = Some(ScenePass {
                        clear: pending_clear.take(),
                        view_projection,
                        draws: Vec::new(),
                    });
                }
                RenderCommand::DrawIndexed(draw) => {
                    if let Some(pass) = current.as_mut() {
                        pass.draws.push(draw);
                    }
                }
                RenderCommand::EndScene => passes.extend(current.take()),
            }
        }

        if let Some(clear) = pending_clear {
            passes.push(ScenePass {
                clear: Some(clear),
                view_projection: Mat4::IDENTITY,
                draws: Vec::new(),
            });
        }
        self.frame_clear_color = clear_color;
        Ok(passes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn begin() -> RenderCommand<u32> {
        RenderCommand::BeginScene { view_projection: Mat4::IDENTITY }
    }

    #[test]
    fn draws_outside_scene_are_rejected() {
        let mut queue = CommandQueue::new();
        assert!(queue.push(RenderCommand::DrawIndexed(1)).is_err());
        assert!(queue.push(RenderCommand::EndScene).is_err());
        assert!(queue.is_empty());
    }

    #[test]
    fn scenes_do_not_nest() {
        let mut queue = CommandQueue::new();
        queue.push(begin()).unwrap();
        assert!(queue.push(begin()).is_err());
        assert!(queue.push(RenderCommand::Clear).is_err());
        assert!(queue.in_scene());
    }

    #[test]
    fn clear_applies_to_next_scene_only() {
        let mut queue = CommandQueue::new();
        let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
        queue.push(RenderCommand::SetClearColor(red)).unwrap();
        queue.push(RenderCommand::Clear).unwrap();
        queue.push(begin()).unwrap();
        queue.push(RenderCommand::DrawIndexed(1)).unwrap();
        queue.push(RenderCommand::DrawIndexed(2)).unwrap();
        queue.push(RenderCommand::EndScene).unwrap();
        queue.push(RenderCommand::BeginScene { view_projection: Mat4::from_scale(glam::Vec3::splat(2.0)) }).unwrap();
        queue.push(RenderCommand::DrawIndexed(3)).unwrap();
        queue.push(RenderCommand::EndScene).unwrap();

        let passes = queue.compile().unwrap();
        assert_eq!(passes.len(), 2);
        assert_eq!(passes[0].clear, Some(red));
        assert_eq!(passes[0].draws, vec![1, 2]);
        assert_eq!(passes[1].clear, None);
        assert_eq!(passes[1].draws, vec![3]);
        assert!(queue.is_empty());
        assert_eq!(queue.clear_color(), red);
    }

    #[test]
    fn lone_clear_still_produces_a_pass() {
        let mut queue: CommandQueue<u32> = CommandQueue::new();
        queue.push(RenderCommand::Clear).unwrap();
        let passes = queue.compile().unwrap();
        assert_eq!(passes.len(), 1);
        assert!(passes[0].draws.is_empty());
        assert!(passes[0].clear.is_some());
    }

    #[test]
    fn clear_color_persists_across_frames() {
        let mut queue: CommandQueue<u32> = CommandQueue::new();
        let blue = Vec4::new(0.0, 0.0, 1.0, 1.0);
        queue.push(RenderCommand::SetClearColor(blue)).unwrap();
        queue.compile().unwrap();

        queue.push(RenderCommand::Clear).unwrap();
        let passes = queue.compile().unwrap();
        assert_eq!(passes[0].clear, Some(blue));
    }

    #[test]
    fn unterminated_scene_fails_and_resets() {
        let mut queue = CommandQueue::new();
        queue.push(begin()).unwrap();
        queue.push(RenderCommand::DrawIndexed(7)).unwrap();
        assert!(queue.compile().is_err());
        assert!(!queue.in_scene());
        assert!(queue.compile().unwrap().is_empty());
    }
}
