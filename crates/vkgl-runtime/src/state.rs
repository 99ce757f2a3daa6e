//! Shadow of the target context state, used to skip redundant calls.
//!
//! Every tracked value is either known (the last value this stack issued) or unknown. A setter
//! issues its call only when the requested value differs from a known value; unknown values
//! are always issued. [`ContextStateStack::invalidate`] forgets everything, which is how each
//! replay starts from the same point regardless of what ran before it.
//!
//! Per-framebuffer state (draw buffers, read buffer, attachments) is object state rather than
//! context state: it is tracked, but `push`/`pop` neither save nor restore it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use vkgl_gl::consts::*;
use vkgl_gl::{GlApi, GlBuffer, GlFramebuffer, GlProgram, GlTexture, GlVertexArray, Rect};

use crate::stats::ContextStats;

/// One framebuffer attach call, as issued to an attachment point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachCall {
    /// Whole level; layered when the texture has layers.
    Whole { texture: GlTexture, level: u32 },
    /// One 2D image: a 2D or multisample texture, or one cube face.
    Texture2d {
        tex_target: GLenum,
        texture: GlTexture,
        level: u32,
    },
    Layer {
        texture: GlTexture,
        level: u32,
        layer: u32,
    },
    Detach,
}

impl AttachCall {
    pub fn texture(&self) -> Option<GlTexture> {
        match *self {
            AttachCall::Whole { texture, .. }
            | AttachCall::Texture2d { texture, .. }
            | AttachCall::Layer { texture, .. } => Some(texture),
            AttachCall::Detach => None,
        }
    }

    fn issue(self, gl: &mut dyn GlApi, target: GLenum, point: GLenum) {
        match self {
            AttachCall::Whole { texture, level } => {
                gl.framebuffer_texture(target, point, Some(texture), level)
            }
            AttachCall::Texture2d {
                tex_target,
                texture,
                level,
            } => gl.framebuffer_texture_2d(target, point, tex_target, Some(texture), level),
            AttachCall::Layer {
                texture,
                level,
                layer,
            } => gl.framebuffer_texture_layer(target, point, Some(texture), level, layer),
            AttachCall::Detach => gl.framebuffer_texture(target, point, None, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct VertexBinding {
    buffer: Option<GlBuffer>,
    offset: u64,
    stride: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct BufferRange {
    buffer: Option<GlBuffer>,
    offset: u64,
    size: u64,
}

/// Context-level values; a missing key or `None` means unknown. Ordered maps keep `pop`
/// restoring in a fixed order.
#[derive(Clone, Debug, Default)]
struct Values {
    program: Option<Option<GlProgram>>,
    vertex_array: Option<Option<GlVertexArray>>,
    read_framebuffer: Option<Option<GlFramebuffer>>,
    draw_framebuffer: Option<Option<GlFramebuffer>>,
    buffers: BTreeMap<GLenum, Option<GlBuffer>>,
    indexed_buffers: BTreeMap<(GLenum, u32), BufferRange>,
    active_texture: Option<u32>,
    textures: BTreeMap<(u32, GLenum), Option<GlTexture>>,
    pixel_store: BTreeMap<GLenum, i32>,
    caps: BTreeMap<GLenum, bool>,
    viewports: BTreeMap<u32, [f32; 4]>,
    depth_ranges: BTreeMap<u32, (f64, f64)>,
    scissors: BTreeMap<u32, Rect>,
    line_width: Option<f32>,
    depth_bias: Option<[f32; 3]>,
    blend_color: Option<[f32; 4]>,
    color_masks: BTreeMap<u32, [bool; 4]>,
    depth_mask: Option<bool>,
    stencil_mask: Option<u32>,
    vertex_buffers: BTreeMap<u32, VertexBinding>,
}

#[derive(Clone, Debug, Default)]
struct FramebufferState {
    draw_buffers: Option<Vec<GLenum>>,
    read_buffer: Option<GLenum>,
    attachments: HashMap<GLenum, AttachCall>,
}

fn note(stats: &ContextStats, changed: bool) -> bool {
    if changed {
        stats.inc_state_changes_issued();
    } else {
        stats.inc_state_changes_elided();
    }
    changed
}

fn update<T: PartialEq>(stats: &ContextStats, slot: &mut Option<T>, value: T) -> bool {
    let changed = slot.as_ref() != Some(&value);
    if changed {
        *slot = Some(value);
    }
    note(stats, changed)
}

fn update_keyed<K: Ord, T: PartialEq>(
    stats: &ContextStats,
    map: &mut BTreeMap<K, T>,
    key: K,
    value: T,
) -> bool {
    let changed = map.get(&key) != Some(&value);
    if changed {
        map.insert(key, value);
    }
    note(stats, changed)
}

pub struct ContextStateStack {
    cur: Values,
    saved: Vec<Values>,
    framebuffers: HashMap<GlFramebuffer, FramebufferState>,
    stats: Arc<ContextStats>,
}

impl ContextStateStack {
    pub fn new(stats: Arc<ContextStats>) -> Self {
        Self {
            cur: Values::default(),
            saved: Vec::new(),
            framebuffers: HashMap::new(),
            stats,
        }
    }

    /// Forgets every known value and drops saved entries.
    pub fn invalidate(&mut self) {
        self.cur = Values::default();
        self.saved.clear();
        self.framebuffers.clear();
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Saves the current context-level values.
    pub fn push(&mut self) {
        self.saved.push(self.cur.clone());
    }

    /// Restores the values saved by the matching [`push`](Self::push), issuing calls only for
    /// values that changed since. Values unknown at push time become unknown again.
    pub fn pop(&mut self, gl: &mut dyn GlApi) {
        let Some(saved) = self.saved.pop() else {
            tracing::warn!("state stack pop without matching push");
            return;
        };

        match saved.program {
            Some(program) => self.use_program(gl, program),
            None => self.cur.program = None,
        }
        // Vertex buffers and the element buffer belong to the vertex array; restore it first.
        match saved.vertex_array {
            Some(vao) => self.bind_vertex_array(gl, vao),
            None => {
                self.cur.vertex_array = None;
                self.cur.vertex_buffers.clear();
                self.cur.buffers.remove(&ELEMENT_ARRAY_BUFFER);
            }
        }
        match saved.read_framebuffer {
            Some(fb) => self.bind_framebuffer(gl, READ_FRAMEBUFFER, fb),
            None => self.cur.read_framebuffer = None,
        }
        match saved.draw_framebuffer {
            Some(fb) => self.bind_framebuffer(gl, DRAW_FRAMEBUFFER, fb),
            None => self.cur.draw_framebuffer = None,
        }

        self.cur.buffers.retain(|k, _| saved.buffers.contains_key(k));
        for (&target, &buffer) in &saved.buffers {
            self.bind_buffer(gl, target, buffer);
        }
        self.cur
            .indexed_buffers
            .retain(|k, _| saved.indexed_buffers.contains_key(k));
        for (&(target, index), range) in &saved.indexed_buffers {
            self.bind_buffer_range(gl, target, index, range.buffer, range.offset, range.size);
        }

        self.cur.textures.retain(|k, _| saved.textures.contains_key(k));
        for (&(unit, target), &texture) in &saved.textures {
            self.bind_texture(gl, unit, target, texture);
        }
        match saved.active_texture {
            Some(unit) => self.active_texture(gl, unit),
            None => self.cur.active_texture = None,
        }

        self.cur
            .pixel_store
            .retain(|k, _| saved.pixel_store.contains_key(k));
        for (&pname, &value) in &saved.pixel_store {
            self.pixel_store(gl, pname, value);
        }
        self.cur.caps.retain(|k, _| saved.caps.contains_key(k));
        for (&cap, &enabled) in &saved.caps {
            self.set_enabled(gl, cap, enabled);
        }

        self.cur.viewports.retain(|k, _| saved.viewports.contains_key(k));
        for (&index, &v) in &saved.viewports {
            self.viewport(gl, index, v);
        }
        self.cur
            .depth_ranges
            .retain(|k, _| saved.depth_ranges.contains_key(k));
        for (&index, &(near, far)) in &saved.depth_ranges {
            self.depth_range(gl, index, near, far);
        }
        self.cur.scissors.retain(|k, _| saved.scissors.contains_key(k));
        for (&index, &rect) in &saved.scissors {
            self.scissor(gl, index, rect);
        }

        match saved.line_width {
            Some(w) => self.line_width(gl, w),
            None => self.cur.line_width = None,
        }
        match saved.depth_bias {
            Some([factor, units, clamp]) => self.depth_bias(gl, factor, units, clamp),
            None => self.cur.depth_bias = None,
        }
        match saved.blend_color {
            Some(c) => self.blend_color(gl, c),
            None => self.cur.blend_color = None,
        }

        self.cur
            .color_masks
            .retain(|k, _| saved.color_masks.contains_key(k));
        for (&index, &mask) in &saved.color_masks {
            self.color_mask(gl, index, mask);
        }
        match saved.depth_mask {
            Some(m) => self.depth_mask(gl, m),
            None => self.cur.depth_mask = None,
        }
        match saved.stencil_mask {
            Some(m) => self.stencil_mask(gl, m),
            None => self.cur.stencil_mask = None,
        }

        self.cur
            .vertex_buffers
            .retain(|k, _| saved.vertex_buffers.contains_key(k));
        for (&binding, vb) in &saved.vertex_buffers {
            self.bind_vertex_buffer(gl, binding, vb.buffer, vb.offset, vb.stride);
        }
    }

    fn note(&self, changed: bool) -> bool {
        note(&self.stats, changed)
    }

    pub fn use_program(&mut self, gl: &mut dyn GlApi, program: Option<GlProgram>) {
        if update(&self.stats, &mut self.cur.program, program) {
            gl.use_program(program);
        }
    }

    pub fn bind_vertex_array(&mut self, gl: &mut dyn GlApi, vao: Option<GlVertexArray>) {
        if update(&self.stats, &mut self.cur.vertex_array, vao) {
            gl.bind_vertex_array(vao);
            self.cur.vertex_buffers.clear();
            self.cur.buffers.remove(&ELEMENT_ARRAY_BUFFER);
        }
    }

    /// `target` is `READ_FRAMEBUFFER` or `DRAW_FRAMEBUFFER`.
    pub fn bind_framebuffer(
        &mut self,
        gl: &mut dyn GlApi,
        target: GLenum,
        framebuffer: Option<GlFramebuffer>,
    ) {
        let slot = match target {
            READ_FRAMEBUFFER => &mut self.cur.read_framebuffer,
            _ => &mut self.cur.draw_framebuffer,
        };
        if update(&self.stats, slot, framebuffer) {
            gl.bind_framebuffer(target, framebuffer);
        }
    }

    pub fn bind_buffer(&mut self, gl: &mut dyn GlApi, target: GLenum, buffer: Option<GlBuffer>) {
        if update_keyed(&self.stats, &mut self.cur.buffers, target, buffer) {
            gl.bind_buffer(target, buffer);
        }
    }

    /// Also updates the generic binding of `target`, as the target does.
    pub fn bind_buffer_range(
        &mut self,
        gl: &mut dyn GlApi,
        target: GLenum,
        index: u32,
        buffer: Option<GlBuffer>,
        offset: u64,
        size: u64,
    ) {
        let range = BufferRange {
            buffer,
            offset,
            size,
        };
        if update_keyed(&self.stats, &mut self.cur.indexed_buffers, (target, index), range) {
            gl.bind_buffer_range(target, index, buffer, offset, size);
            if buffer.is_some() {
                self.cur.buffers.insert(target, buffer);
            }
        }
    }

    pub fn active_texture(&mut self, gl: &mut dyn GlApi, unit: u32) {
        if update(&self.stats, &mut self.cur.active_texture, unit) {
            gl.active_texture(unit);
        }
    }

    pub fn bind_texture(
        &mut self,
        gl: &mut dyn GlApi,
        unit: u32,
        target: GLenum,
        texture: Option<GlTexture>,
    ) {
        if self.cur.textures.get(&(unit, target)) == Some(&texture) {
            self.note(false);
            return;
        }
        self.active_texture(gl, unit);
        if update_keyed(&self.stats, &mut self.cur.textures, (unit, target), texture) {
            gl.bind_texture(target, texture);
        }
    }

    pub fn pixel_store(&mut self, gl: &mut dyn GlApi, pname: GLenum, value: i32) {
        if update_keyed(&self.stats, &mut self.cur.pixel_store, pname, value) {
            gl.pixel_store(pname, value);
        }
    }

    pub fn set_enabled(&mut self, gl: &mut dyn GlApi, cap: GLenum, enabled: bool) {
        if update_keyed(&self.stats, &mut self.cur.caps, cap, enabled) {
            if enabled {
                gl.enable(cap);
            } else {
                gl.disable(cap);
            }
        }
    }

    /// `v` is `[x, y, width, height]`.
    pub fn viewport(&mut self, gl: &mut dyn GlApi, index: u32, v: [f32; 4]) {
        if update_keyed(&self.stats, &mut self.cur.viewports, index, v) {
            gl.viewport_indexed(index, v[0], v[1], v[2], v[3]);
        }
    }

    pub fn depth_range(&mut self, gl: &mut dyn GlApi, index: u32, near: f64, far: f64) {
        if update_keyed(&self.stats, &mut self.cur.depth_ranges, index, (near, far)) {
            gl.depth_range_indexed(index, near, far);
        }
    }

    pub fn scissor(&mut self, gl: &mut dyn GlApi, index: u32, rect: Rect) {
        if update_keyed(&self.stats, &mut self.cur.scissors, index, rect) {
            gl.scissor_indexed(index, rect);
        }
    }

    pub fn line_width(&mut self, gl: &mut dyn GlApi, width: f32) {
        if update(&self.stats, &mut self.cur.line_width, width) {
            gl.line_width(width);
        }
    }

    pub fn depth_bias(&mut self, gl: &mut dyn GlApi, factor: f32, units: f32, clamp: f32) {
        if update(&self.stats, &mut self.cur.depth_bias, [factor, units, clamp]) {
            gl.polygon_offset_clamp(factor, units, clamp);
        }
    }

    pub fn blend_color(&mut self, gl: &mut dyn GlApi, color: [f32; 4]) {
        if update(&self.stats, &mut self.cur.blend_color, color) {
            gl.blend_color(color);
        }
    }

    pub fn color_mask(&mut self, gl: &mut dyn GlApi, index: u32, mask: [bool; 4]) {
        if update_keyed(&self.stats, &mut self.cur.color_masks, index, mask) {
            gl.color_mask(index, mask);
        }
    }

    pub fn depth_mask(&mut self, gl: &mut dyn GlApi, enabled: bool) {
        if update(&self.stats, &mut self.cur.depth_mask, enabled) {
            gl.depth_mask(enabled);
        }
    }

    pub fn stencil_mask(&mut self, gl: &mut dyn GlApi, mask: u32) {
        if update(&self.stats, &mut self.cur.stencil_mask, mask) {
            gl.stencil_mask(mask);
        }
    }

    pub fn bind_vertex_buffer(
        &mut self,
        gl: &mut dyn GlApi,
        binding: u32,
        buffer: Option<GlBuffer>,
        offset: u64,
        stride: u32,
    ) {
        let vb = VertexBinding {
            buffer,
            offset,
            stride,
        };
        if update_keyed(&self.stats, &mut self.cur.vertex_buffers, binding, vb) {
            gl.bind_vertex_buffer(binding, buffer, offset, stride);
        }
    }

    fn bound_framebuffer(&self, target: GLenum) -> Option<GlFramebuffer> {
        let slot = match target {
            READ_FRAMEBUFFER => self.cur.read_framebuffer,
            _ => self.cur.draw_framebuffer,
        };
        slot.flatten()
    }

    /// Sets the draw buffers of the bound draw framebuffer.
    pub fn draw_buffers(&mut self, gl: &mut dyn GlApi, buffers: &[GLenum]) {
        let Some(fb) = self.bound_framebuffer(DRAW_FRAMEBUFFER) else {
            self.note(true);
            gl.draw_buffers(buffers);
            return;
        };
        let state = self.framebuffers.entry(fb).or_default();
        let changed = state.draw_buffers.as_deref() != Some(buffers);
        if changed {
            state.draw_buffers = Some(buffers.to_vec());
            gl.draw_buffers(buffers);
        }
        self.note(changed);
    }

    /// Sets the read buffer of the bound read framebuffer.
    pub fn read_buffer(&mut self, gl: &mut dyn GlApi, buffer: GLenum) {
        let Some(fb) = self.bound_framebuffer(READ_FRAMEBUFFER) else {
            self.note(true);
            gl.read_buffer(buffer);
            return;
        };
        let state = self.framebuffers.entry(fb).or_default();
        let changed = state.read_buffer != Some(buffer);
        if changed {
            state.read_buffer = Some(buffer);
            gl.read_buffer(buffer);
        }
        self.note(changed);
    }

    /// Whether `point` of the framebuffer bound to `target` is known to be detached.
    pub fn is_detached(&self, target: GLenum, point: GLenum) -> bool {
        self.bound_framebuffer(target)
            .and_then(|fb| self.framebuffers.get(&fb))
            .and_then(|state| state.attachments.get(&point))
            == Some(&AttachCall::Detach)
    }

    /// Attaches to `point` of the framebuffer bound to `target`. The combined depth-stencil
    /// point is tracked as its depth and stencil halves.
    pub fn attach(&mut self, gl: &mut dyn GlApi, target: GLenum, point: GLenum, call: AttachCall) {
        let points: &[GLenum] = if point == DEPTH_STENCIL_ATTACHMENT {
            &[DEPTH_ATTACHMENT, STENCIL_ATTACHMENT]
        } else {
            std::slice::from_ref(&point)
        };
        let Some(fb) = self.bound_framebuffer(target) else {
            self.note(true);
            call.issue(gl, target, point);
            return;
        };
        let state = self.framebuffers.entry(fb).or_default();
        let changed = points
            .iter()
            .any(|p| state.attachments.get(p) != Some(&call));
        if changed {
            for &p in points {
                state.attachments.insert(p, call);
            }
            call.issue(gl, target, point);
        }
        self.note(changed);
    }

    /// The target unbinds a deleted object from every binding point.
    pub fn forget_buffer(&mut self, buffer: GlBuffer) {
        for bound in self.cur.buffers.values_mut() {
            if *bound == Some(buffer) {
                *bound = None;
            }
        }
        for range in self.cur.indexed_buffers.values_mut() {
            if range.buffer == Some(buffer) {
                range.buffer = None;
            }
        }
        self.cur
            .vertex_buffers
            .retain(|_, vb| vb.buffer != Some(buffer));
        self.saved.clear();
    }

    pub fn forget_texture(&mut self, texture: GlTexture) {
        for bound in self.cur.textures.values_mut() {
            if *bound == Some(texture) {
                *bound = None;
            }
        }
        for state in self.framebuffers.values_mut() {
            state
                .attachments
                .retain(|_, call| call.texture() != Some(texture));
        }
        self.saved.clear();
    }

    pub fn forget_framebuffer(&mut self, framebuffer: GlFramebuffer) {
        for slot in [&mut self.cur.read_framebuffer, &mut self.cur.draw_framebuffer] {
            if *slot == Some(Some(framebuffer)) {
                *slot = Some(None);
            }
        }
        self.framebuffers.remove(&framebuffer);
        self.saved.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vkgl_gl::{GlCall, RecordingGl};

    fn stack() -> (ContextStateStack, Arc<ContextStats>) {
        let stats = Arc::new(ContextStats::new());
        (ContextStateStack::new(stats.clone()), stats)
    }

    #[test]
    fn repeated_values_are_elided() {
        let (mut state, stats) = stack();
        let mut gl = RecordingGl::new();
        let rec = gl.clone();

        state.use_program(&mut gl, Some(GlProgram(3)));
        state.use_program(&mut gl, Some(GlProgram(3)));
        state.set_enabled(&mut gl, SCISSOR_TEST, true);
        state.set_enabled(&mut gl, SCISSOR_TEST, true);
        state.set_enabled(&mut gl, SCISSOR_TEST, false);

        assert_eq!(
            rec.calls(),
            vec![
                GlCall::UseProgram(Some(GlProgram(3))),
                GlCall::Enable(SCISSOR_TEST),
                GlCall::Disable(SCISSOR_TEST),
            ]
        );
        let snap = stats.snapshot();
        assert_eq!(snap.state_changes_issued, 3);
        assert_eq!(snap.state_changes_elided, 2);
    }

    #[test]
    fn invalidate_reissues_everything() {
        let (mut state, _) = stack();
        let mut gl = RecordingGl::new();
        let rec = gl.clone();

        state.line_width(&mut gl, 2.0);
        state.invalidate();
        state.line_width(&mut gl, 2.0);

        assert_eq!(rec.calls(), vec![GlCall::LineWidth(2.0), GlCall::LineWidth(2.0)]);
    }

    #[test]
    fn pop_restores_only_what_changed() {
        let (mut state, _) = stack();
        let mut gl = RecordingGl::new();
        let rec = gl.clone();

        state.set_enabled(&mut gl, SCISSOR_TEST, false);
        state.depth_mask(&mut gl, false);
        state.line_width(&mut gl, 1.0);
        state.push();
        state.set_enabled(&mut gl, SCISSOR_TEST, true);
        state.depth_mask(&mut gl, true);
        rec.clear_calls();

        state.pop(&mut gl);
        let calls = rec.take_calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.contains(&GlCall::Disable(SCISSOR_TEST)));
        assert!(calls.contains(&GlCall::DepthMask(false)));

        // Restored values are known again.
        state.depth_mask(&mut gl, false);
        assert!(rec.calls().is_empty());
    }

    #[test]
    fn values_unknown_at_push_are_unknown_after_pop() {
        let (mut state, _) = stack();
        let mut gl = RecordingGl::new();
        let rec = gl.clone();

        state.push();
        state.stencil_mask(&mut gl, 0xff);
        state.pop(&mut gl);
        rec.clear_calls();

        state.stencil_mask(&mut gl, 0xff);
        assert_eq!(rec.calls(), vec![GlCall::StencilMask(0xff)]);
    }

    #[test]
    fn texture_binds_select_the_unit_first() {
        let (mut state, _) = stack();
        let mut gl = RecordingGl::new();
        let rec = gl.clone();
        let tex = gl.create_texture();
        rec.clear_calls();

        state.bind_texture(&mut gl, 2, TEXTURE_2D, Some(tex));
        state.bind_texture(&mut gl, 2, TEXTURE_2D, Some(tex));

        assert_eq!(
            rec.calls(),
            vec![
                GlCall::ActiveTexture(2),
                GlCall::BindTexture {
                    target: TEXTURE_2D,
                    texture: Some(tex),
                },
            ]
        );
    }

    #[test]
    fn attachments_are_tracked_per_framebuffer() {
        let (mut state, _) = stack();
        let mut gl = RecordingGl::new();
        let rec = gl.clone();
        let fb_a = gl.create_framebuffer();
        let fb_b = gl.create_framebuffer();
        let tex = gl.create_texture();
        let call = AttachCall::Texture2d {
            tex_target: TEXTURE_2D,
            texture: tex,
            level: 0,
        };
        rec.clear_calls();

        state.bind_framebuffer(&mut gl, DRAW_FRAMEBUFFER, Some(fb_a));
        state.attach(&mut gl, DRAW_FRAMEBUFFER, COLOR_ATTACHMENT0, call);
        state.bind_framebuffer(&mut gl, DRAW_FRAMEBUFFER, Some(fb_b));
        state.attach(&mut gl, DRAW_FRAMEBUFFER, COLOR_ATTACHMENT0, call);
        state.bind_framebuffer(&mut gl, DRAW_FRAMEBUFFER, Some(fb_a));
        state.attach(&mut gl, DRAW_FRAMEBUFFER, COLOR_ATTACHMENT0, call);

        let attaches = rec
            .calls()
            .iter()
            .filter(|c| matches!(c, GlCall::FramebufferTexture2d { .. }))
            .count();
        assert_eq!(attaches, 2);
    }

    #[test]
    fn deleting_a_texture_forgets_its_attachments() {
        let (mut state, _) = stack();
        let mut gl = RecordingGl::new();
        let fb = gl.create_framebuffer();
        let tex = gl.create_texture();
        state.bind_framebuffer(&mut gl, READ_FRAMEBUFFER, Some(fb));
        state.attach(&mut gl, READ_FRAMEBUFFER, DEPTH_ATTACHMENT, AttachCall::Detach);
        assert!(state.is_detached(READ_FRAMEBUFFER, DEPTH_ATTACHMENT));

        state.attach(
            &mut gl,
            READ_FRAMEBUFFER,
            DEPTH_ATTACHMENT,
            AttachCall::Whole {
                texture: tex,
                level: 0,
            },
        );
        state.forget_texture(tex);
        assert!(!state.is_detached(READ_FRAMEBUFFER, DEPTH_ATTACHMENT));
    }
}
