//! A software GL context for tests and offline checking.
//!
//! `HeadlessGl` implements [`ShaderBackend`] and [`FrameBackend`] without a
//! GPU. Compilation and linking go through the structural checks in
//! [`glsl`](super::glsl); object lifetimes follow GL rules (a deleted shader
//! stays alive while attached to a program). The handle-count probes
//! ([`live_shaders`](HeadlessGl::live_shaders),
//! [`live_programs`](HeadlessGl::live_programs)) let tests verify that
//! nothing leaks.

use std::cell::RefCell;
use std::collections::BTreeMap;

use super::backend::{FrameBackend, ShaderBackend};
use super::glsl::{self, ShaderInterface};
use super::shader::ShaderStage;

/// Shader handle issued by [`HeadlessGl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeadlessShader(u32);

/// Program handle issued by [`HeadlessGl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeadlessProgram(u32);

#[derive(Debug)]
struct ShaderObject {
    stage: ShaderStage,
    source: String,
    interface: Option<ShaderInterface>,
    info_log: String,
    attachments: usize,
    delete_pending: bool,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<HeadlessShader>,
    linked: bool,
    info_log: String,
}

#[derive(Debug, Default)]
struct FrameState {
    viewport: Option<[i32; 4]>,
    clear_color: [f32; 4],
    depth_test: bool,
    clears: Vec<bool>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u32,
    created: usize,
    shaders: BTreeMap<u32, ShaderObject>,
    programs: BTreeMap<u32, ProgramObject>,
    frame: FrameState,
}

impl State {
    fn allocate(&mut self, limit: Option<usize>) -> Result<u32, String> {
        if let Some(limit) = limit {
            if self.shaders.len() + self.programs.len() >= limit {
                return Err(format!("GL_OUT_OF_MEMORY: object limit of {limit} reached"));
            }
        }
        self.next_id += 1;
        self.created += 1;
        Ok(self.next_id)
    }

    /// Drops one attachment from `shader`, freeing it if it was waiting on that.
    fn release_attachment(&mut self, shader: HeadlessShader) {
        let free = match self.shaders.get_mut(&shader.0) {
            Some(obj) => {
                obj.attachments = obj.attachments.saturating_sub(1);
                obj.attachments == 0 && obj.delete_pending
            }
            None => false,
        };
        if free {
            self.shaders.remove(&shader.0);
        }
    }

    /// The compiled interface of the single `stage` shader in `attached`.
    fn stage_interface(
        &self,
        attached: &[HeadlessShader],
        stage: ShaderStage,
    ) -> Result<&ShaderInterface, String> {
        let mut objects = attached
            .iter()
            .filter_map(|s| self.shaders.get(&s.0))
            .filter(|obj| obj.stage == stage);
        let obj = objects
            .next()
            .ok_or_else(|| format!("ERROR: No {stage} shader attached to the program.\n"))?;
        if objects.next().is_some() {
            return Err(format!("ERROR: Multiple {stage} shaders attached to the program.\n"));
        }
        obj.interface
            .as_ref()
            .ok_or_else(|| format!("ERROR: The attached {stage} shader is not compiled.\n"))
    }

    fn link(&self, attached: &[HeadlessShader]) -> Result<(), String> {
        let vertex = self.stage_interface(attached, ShaderStage::Vertex)?;
        let fragment = self.stage_interface(attached, ShaderStage::Fragment)?;
        glsl::link(vertex, fragment)
    }
}

/// Software [`ShaderBackend`] + [`FrameBackend`].
///
/// Single-threaded like a real GL context: uses `RefCell` so that every call
/// takes `&self`.
#[derive(Debug, Default)]
pub struct HeadlessGl {
    state: RefCell<State>,
    object_limit: Option<usize>,
}

impl HeadlessGl {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that refuses to create objects once `limit` shaders and
    /// programs are alive, for exercising allocation failures.
    pub fn with_object_limit(limit: usize) -> Self {
        Self {
            state: RefCell::default(),
            object_limit: Some(limit),
        }
    }

    /// Shader objects currently allocated, including ones flagged for
    /// deletion but still attached to a program.
    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    /// Program objects currently allocated.
    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    /// Total shader and program objects ever created.
    pub fn objects_created(&self) -> usize {
        self.state.borrow().created
    }

    /// Shaders currently attached to `program`, in attach order.
    pub fn attached_shaders(&self, program: HeadlessProgram) -> Vec<HeadlessShader> {
        self.state
            .borrow()
            .programs
            .get(&program.0)
            .map(|p| p.attached.clone())
            .unwrap_or_default()
    }

    /// Last viewport set, as `[x, y, width, height]`.
    pub fn viewport_rect(&self) -> Option<[i32; 4]> {
        self.state.borrow().frame.viewport
    }

    pub fn current_clear_color(&self) -> [f32; 4] {
        self.state.borrow().frame.clear_color
    }

    pub fn depth_test_enabled(&self) -> bool {
        self.state.borrow().frame.depth_test
    }

    /// One entry per `clear` call; `true` when the depth buffer was included.
    pub fn clears(&self) -> Vec<bool> {
        self.state.borrow().frame.clears.clone()
    }
}

impl ShaderBackend for HeadlessGl {
    type Shader = HeadlessShader;
    type Program = HeadlessProgram;

    fn create_shader(&self, stage: ShaderStage) -> Result<HeadlessShader, String> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate(self.object_limit)?;
        state.shaders.insert(
            id,
            ShaderObject {
                stage,
                source: String::new(),
                interface: None,
                info_log: String::new(),
                attachments: 0,
                delete_pending: false,
            },
        );
        Ok(HeadlessShader(id))
    }

    fn shader_source(&self, shader: HeadlessShader, source: &str) {
        match self.state.borrow_mut().shaders.get_mut(&shader.0) {
            Some(obj) => obj.source = source.to_owned(),
            None => log::warn!("shader_source on unknown shader {shader:?}"),
        }
    }

    fn compile_shader(&self, shader: HeadlessShader) {
        let mut state = self.state.borrow_mut();
        let Some(obj) = state.shaders.get_mut(&shader.0) else {
            log::warn!("compile_shader on unknown shader {shader:?}");
            return;
        };
        match glsl::analyze(obj.stage, &obj.source) {
            Ok(interface) => {
                obj.interface = Some(interface);
                obj.info_log.clear();
            }
            Err(failure) => {
                obj.interface = None;
                obj.info_log = failure.log();
            }
        }
    }

    fn shader_compile_status(&self, shader: HeadlessShader) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader.0)
            .is_some_and(|obj| obj.interface.is_some())
    }

    fn shader_info_log(&self, shader: HeadlessShader) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader.0)
            .map(|obj| obj.info_log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: HeadlessShader) {
        let mut state = self.state.borrow_mut();
        let attached = match state.shaders.get_mut(&shader.0) {
            Some(obj) if obj.attachments > 0 => {
                obj.delete_pending = true;
                true
            }
            Some(_) => false,
            None => return,
        };
        if !attached {
            state.shaders.remove(&shader.0);
        }
    }

    fn create_program(&self) -> Result<HeadlessProgram, String> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate(self.object_limit)?;
        state.programs.insert(id, ProgramObject::default());
        Ok(HeadlessProgram(id))
    }

    fn attach_shader(&self, program: HeadlessProgram, shader: HeadlessShader) {
        let mut state = self.state.borrow_mut();
        let State {
            shaders, programs, ..
        } = &mut *state;
        let (Some(prog), Some(obj)) = (programs.get_mut(&program.0), shaders.get_mut(&shader.0)) else {
            log::warn!("attach_shader with unknown handle {program:?} / {shader:?}");
            return;
        };
        if !prog.attached.contains(&shader) {
            prog.attached.push(shader);
            obj.attachments += 1;
        }
    }

    fn detach_shader(&self, program: HeadlessProgram, shader: HeadlessShader) {
        let mut state = self.state.borrow_mut();
        let was_attached = match state.programs.get_mut(&program.0) {
            Some(prog) => {
                let before = prog.attached.len();
                prog.attached.retain(|s| *s != shader);
                prog.attached.len() != before
            }
            None => false,
        };
        if was_attached {
            state.release_attachment(shader);
        }
    }

    fn link_program(&self, program: HeadlessProgram) {
        let mut state = self.state.borrow_mut();
        let Some(attached) = state.programs.get(&program.0).map(|p| p.attached.clone()) else {
            log::warn!("link_program on unknown program {program:?}");
            return;
        };
        let outcome = state.link(&attached);
        if let Some(prog) = state.programs.get_mut(&program.0) {
            match outcome {
                Ok(()) => {
                    prog.linked = true;
                    prog.info_log.clear();
                }
                Err(log) => {
                    prog.linked = false;
                    prog.info_log = log;
                }
            }
        }
    }

    fn program_link_status(&self, program: HeadlessProgram) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program.0)
            .is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: HeadlessProgram) -> String {
        self.state
            .borrow()
            .programs
            .get(&program.0)
            .map(|p| p.info_log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&self, program: HeadlessProgram) {
        let mut state = self.state.borrow_mut();
        if let Some(prog) = state.programs.remove(&program.0) {
            for shader in prog.attached {
                state.release_attachment(shader);
            }
        }
    }
}

impl FrameBackend for HeadlessGl {
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.state.borrow_mut().frame.viewport = Some([x, y, width, height]);
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        self.state.borrow_mut().frame.clear_color = rgba;
    }

    fn set_depth_test(&self, enabled: bool) {
        self.state.borrow_mut().frame.depth_test = enabled;
    }

    fn clear(&self, depth: bool) {
        self.state.borrow_mut().frame.clears.push(depth);
    }
}
