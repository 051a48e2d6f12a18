use super::*;
use std::sync::Mutex;
use crate::graphics_device::mock_graphics_device::mock_context;
use crate::graphics_device::{CommandBuffer, Extent2D};
use crate::render_feature::{downcast_data_mut, RenderFeatureData};

// ============================================================================
// Helpers
// ============================================================================

type Calls = Arc<Mutex<Vec<String>>>;

struct TracingFeature {
    name: &'static str,
    calls: Calls,
}

struct TracingData {
    resolved: u32,
}

impl TracingFeature {
    fn new(name: &'static str, calls: &Calls) -> Arc<Self> {
        Arc::new(Self { name, calls: calls.clone() })
    }

    fn record(&self, phase: &str) {
        self.calls.lock().unwrap().push(format!("{}:{}", phase, self.name));
    }
}

impl RenderFeature for TracingFeature {
    fn create_data(&self, _camera: &Camera) -> Result<Box<RenderFeatureData>> {
        self.record("create");
        Ok(Box::new(TracingData { resolved: 0 }))
    }

    fn resolve_data(&self, data: &mut RenderFeatureData, _camera: &Camera) -> Result<()> {
        self.record("resolve");
        downcast_data_mut::<TracingData>(data, self.name)?.resolved += 1;
        Ok(())
    }

    fn destroy_data(&self, _data: Box<RenderFeatureData>) -> Result<()> {
        self.record("destroy");
        Ok(())
    }

    fn prepare(&self, _data: &mut RenderFeatureData, _camera: &Camera) -> Result<()> {
        self.record("prepare");
        Ok(())
    }

    fn execute(
        &self,
        _data: &mut RenderFeatureData,
        _cmd: &mut dyn CommandBuffer,
        _camera: &Camera,
        _renderables: &[RenderObject],
    ) -> Result<()> {
        self.record("execute");
        Ok(())
    }

    fn submit(&self, _data: &mut RenderFeatureData, cmd: &mut dyn CommandBuffer) -> Result<()> {
        self.record("submit");
        cmd.submit(&[], &[])
    }

    fn finish(&self, _data: &mut RenderFeatureData, cmd: &mut dyn CommandBuffer) -> Result<()> {
        self.record("finish");
        cmd.wait()
    }
}

/// Renderer with preliminary "P" and main features "A", "B"
fn renderer(ctx: &Arc<GraphicsContext>, calls: &Calls) -> RendererBase {
    let mut renderer = RendererBase::new(ctx, "Test");
    renderer.push_preliminary_render_feature("P", TracingFeature::new("P", calls)).unwrap();
    renderer.push_render_feature("A", TracingFeature::new("A", calls)).unwrap();
    renderer.push_render_feature("B", TracingFeature::new("B", calls)).unwrap();
    renderer
}

fn take(calls: &Calls) -> Vec<String> {
    std::mem::take(&mut *calls.lock().unwrap())
}

fn count(calls: &[String], call: &str) -> usize {
    calls.iter().filter(|c| c.as_str() == call).count()
}

// ============================================================================
// Composition
// ============================================================================

#[test]
fn test_duplicate_feature_names_fail() {
    let (_device, ctx) = mock_context();
    let calls = Calls::default();
    let mut renderer = renderer(&ctx, &calls);

    assert!(renderer.push_render_feature("A", TracingFeature::new("A", &calls)).is_err());
    assert!(renderer.push_render_feature("P", TracingFeature::new("P", &calls)).is_err());
    assert!(renderer.push_preliminary_render_feature("B", TracingFeature::new("B", &calls)).is_err());
    assert_eq!(renderer.feature_names().collect::<Vec<_>>(), vec!["P", "A", "B"]);
}

#[test]
fn test_create_then_hook_then_resolve() {
    let (device, ctx) = mock_context();
    let calls = Calls::default();
    let mut renderer = renderer(&ctx, &calls);
    let hook_calls = calls.clone();
    renderer.set_resolve_hook(move |_data| {
        hook_calls.lock().unwrap().push("hook".to_string());
        Ok(())
    });
    let camera = Camera::new(&ctx, "Main", Extent2D::new(16, 16)).unwrap();

    let data = renderer.create_renderer_data(&camera).unwrap();

    assert_eq!(take(&calls), vec![
        "create:P", "create:A", "create:B", "hook", "resolve:P", "resolve:A", "resolve:B",
    ]);
    assert_eq!(data.feature_count(), 3);
    assert_eq!(device.count_events("create_command_buffer"), 3);
    assert!(!data.preliminary_finished());
}

#[test]
fn test_refresh_rewires_and_resolves_again() {
    let (_device, ctx) = mock_context();
    let calls = Calls::default();
    let renderer = renderer(&ctx, &calls);
    let camera = Camera::new(&ctx, "Main", Extent2D::new(16, 16)).unwrap();
    let mut data = renderer.create_renderer_data(&camera).unwrap();

    renderer.refresh_renderer_data(&mut data, &camera).unwrap();

    assert_eq!(data.data::<TracingData>("A").unwrap().resolved, 2);
    assert_eq!(data.data::<TracingData>("P").unwrap().resolved, 2);
    assert!(data.data::<u32>("A").is_err());
    assert!(data.data::<TracingData>("Missing").is_err());
}

#[test]
fn test_destroy_in_reverse_order() {
    let (_device, ctx) = mock_context();
    let calls = Calls::default();
    let renderer = renderer(&ctx, &calls);
    let camera = Camera::new(&ctx, "Main", Extent2D::new(16, 16)).unwrap();
    let data = renderer.create_renderer_data(&camera).unwrap();
    take(&calls);

    renderer.destroy_renderer_data(data).unwrap();

    assert_eq!(take(&calls), vec!["destroy:B", "destroy:A", "destroy:P"]);
}

// ============================================================================
// Frame protocol
// ============================================================================

#[test]
fn test_first_frame_runs_preliminary_then_main_in_push_order() {
    let (_device, ctx) = mock_context();
    let calls = Calls::default();
    let renderer = renderer(&ctx, &calls);
    let camera = Camera::new(&ctx, "Main", Extent2D::new(16, 16)).unwrap();
    let mut data = renderer.create_renderer_data(&camera).unwrap();
    take(&calls);

    renderer.render_frame(&mut data, &camera, &[]).unwrap();

    let mut expected = Vec::new();
    for phase in ["prepare", "execute", "submit", "finish"] {
        for feature in ["P", "A", "B"] {
            expected.push(format!("{}:{}", phase, feature));
        }
    }
    assert_eq!(take(&calls), expected);
    assert!(data.preliminary_finished());
}

#[test]
fn test_preliminary_features_run_once() {
    let (device, ctx) = mock_context();
    let calls = Calls::default();
    let renderer = renderer(&ctx, &calls);
    let camera = Camera::new(&ctx, "Main", Extent2D::new(16, 16)).unwrap();
    let mut data = renderer.create_renderer_data(&camera).unwrap();
    take(&calls);
    device.clear_commands();

    for _ in 0..4 {
        renderer.render_frame(&mut data, &camera, &[]).unwrap();
    }

    let calls = take(&calls);
    for phase in ["prepare", "execute", "submit", "finish"] {
        assert_eq!(count(&calls, &format!("{}:P", phase)), 1);
        assert_eq!(count(&calls, &format!("{}:A", phase)), 4);
        assert_eq!(count(&calls, &format!("{}:B", phase)), 4);
    }
    let submits = device.commands().iter().filter(|c| c.starts_with("submit")).count();
    assert_eq!(submits, 1 + 2 * 4);
}

#[test]
fn test_preliminary_still_pending_until_finish() {
    let (_device, ctx) = mock_context();
    let calls = Calls::default();
    let renderer = renderer(&ctx, &calls);
    let camera = Camera::new(&ctx, "Main", Extent2D::new(16, 16)).unwrap();
    let mut data = renderer.create_renderer_data(&camera).unwrap();
    take(&calls);

    renderer.prepare_renderer(&mut data, &camera).unwrap();
    renderer.prepare_renderer(&mut data, &camera).unwrap();

    assert_eq!(count(&take(&calls), "prepare:P"), 2);
    assert!(!data.preliminary_finished());
}
