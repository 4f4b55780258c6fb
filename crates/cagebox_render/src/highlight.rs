//! Selection highlight uniforms
//!
//! The core does not own shader state. On selection change it starts or
//! stops a highlight per instance through a [`HighlightSink`]; the default
//! sink keeps one [`HighlightUniforms`] block per highlighted instance for
//! the renderer to upload.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use cagebox_core::{InstanceId, Material};

/// Glow parameters laid out for a uniform buffer
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct HighlightUniforms {
    /// RGBA glow color
    pub color: [f32; 4],
    /// Seconds since the highlight started
    pub time: f32,
    pub waviness: f32,
    pub falloff: f32,
    pub internal_radius: f32,
    pub sharpness: f32,
    pub opacity: f32,
    /// 1.0 to use Schlick's Fresnel approximation, 0.0 for the plain rim
    pub use_schlick_fresnel: f32,
    /// Reflectance at normal incidence
    pub f0: f32,
}

impl Default for HighlightUniforms {
    fn default() -> Self {
        Self {
            color: [1.0; 4],
            time: 0.0,
            waviness: 0.09,
            falloff: 0.1,
            internal_radius: 6.0,
            sharpness: 0.5,
            opacity: 1.0,
            use_schlick_fresnel: 0.0,
            f0: 0.04,
        }
    }
}

impl HighlightUniforms {
    pub fn with_color(mut self, material: Material) -> Self {
        self.color = material.base_color;
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Receiver for selection visual state
pub trait HighlightSink {
    fn start(&mut self, instance: &InstanceId, material: Material);
    fn stop(&mut self, instance: &InstanceId);
}

/// Stop the previous highlight and start the next one
pub fn switch_highlight<S: HighlightSink + ?Sized>(
    sink: &mut S,
    previous: Option<&InstanceId>,
    next: Option<(&InstanceId, Material)>,
) {
    if let Some(prev) = previous {
        if next.map(|(id, _)| id) != Some(prev) {
            sink.stop(prev);
        }
    }
    if let Some((id, material)) = next {
        sink.start(id, material);
    }
}

/// Default sink holding uniforms for each highlighted instance
#[derive(Debug, Default)]
pub struct SelectionHighlights {
    active: HashMap<InstanceId, HighlightUniforms>,
    template: HighlightUniforms,
}

impl SelectionHighlights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uniform values new highlights start from
    pub fn with_template(mut self, template: HighlightUniforms) -> Self {
        self.template = template;
        self
    }

    /// Toggle the Fresnel model on every highlight, current and future
    pub fn set_schlick_fresnel(&mut self, enabled: bool) {
        let value = if enabled { 1.0 } else { 0.0 };
        self.template.use_schlick_fresnel = value;
        for uniforms in self.active.values_mut() {
            uniforms.use_schlick_fresnel = value;
        }
    }

    /// Advance the animation clock
    pub fn update(&mut self, dt: f32) {
        for uniforms in self.active.values_mut() {
            uniforms.time += dt;
        }
    }

    pub fn uniforms(&self, instance: &InstanceId) -> Option<&HighlightUniforms> {
        self.active.get(instance)
    }

    pub fn is_highlighted(&self, instance: &InstanceId) -> bool {
        self.active.contains_key(instance)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

impl HighlightSink for SelectionHighlights {
    fn start(&mut self, instance: &InstanceId, material: Material) {
        let uniforms = self.template.with_color(material);
        if self.active.insert(instance.clone(), uniforms).is_some() {
            log::trace!("Restarted highlight on {}", instance);
        } else {
            log::debug!("Highlight started on {}", instance);
        }
    }

    fn stop(&mut self, instance: &InstanceId) {
        if self.active.remove(instance).is_some() {
            log::debug!("Highlight stopped on {}", instance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<HighlightUniforms>(), 48);
        assert_eq!(HighlightUniforms::default().as_bytes().len(), 48);
        assert_eq!(HighlightUniforms::default().waviness, 0.09);
    }

    #[test]
    fn test_switch_selection() {
        let mut sink = SelectionHighlights::new();
        let a = InstanceId::new("a");
        let b = InstanceId::new("b");
        switch_highlight(&mut sink, None, Some((&a, Material::SIENNA)));
        assert!(sink.is_highlighted(&a));
        assert_eq!(sink.uniforms(&a).unwrap().color, Material::SIENNA.base_color);

        switch_highlight(&mut sink, Some(&a), Some((&b, Material::WHITE)));
        assert!(!sink.is_highlighted(&a));
        assert!(sink.is_highlighted(&b));

        switch_highlight(&mut sink, Some(&b), None);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_reselect_keeps_highlight() {
        let mut sink = SelectionHighlights::new();
        let a = InstanceId::new("a");
        switch_highlight(&mut sink, None, Some((&a, Material::WHITE)));
        switch_highlight(&mut sink, Some(&a), Some((&a, Material::WHITE)));
        assert!(sink.is_highlighted(&a));
    }

    #[test]
    fn test_time_and_fresnel() {
        let mut sink = SelectionHighlights::new();
        let a = InstanceId::new("a");
        sink.start(&a, Material::WHITE);
        sink.update(0.5);
        sink.set_schlick_fresnel(true);
        let uniforms = sink.uniforms(&a).unwrap();
        assert_eq!(uniforms.time, 0.5);
        assert_eq!(uniforms.use_schlick_fresnel, 1.0);
    }
}
