//! Pipeline Failure Integration Tests
//!
//! Tests for:
//! - Allocation failure: pass skipped for the frame, partial acquires rolled back
//! - Missing override shaders
//! - Cleanup without a command context and frame-end leak detection
//! - Execute and backend failures
//! - Config-driven renderers

mod common;

use glam::Vec4;
use mask_passes::renderer::backend::{CommandExecutor, ExecuteTarget};
use mask_passes::renderer::feature::{MaskRendererFeature, MaskableRendererFeature};
use mask_passes::renderer::graph::{
    BufferRole, ClearConfig, CommandBuffer, ExecuteContext, FrameBuilder, MaterialLibrary,
    OverrideShader, PassFrame, PoolConfig, RenderCommand, RenderNode, RenderPassEvent,
    SetupContext, TintCompositor,
};
use mask_passes::renderer::settings::{MaskableSettings, PassSettings};
use mask_passes::scene::{Skybox, StaticScene};
use mask_passes::{
    CullingOracle, FeatureConfig, FeatureRenderer, MaskError, MaskPass, SoftwareExecutor,
};

use common::{covered, quad, setup, setup_with};

// ============================================================================
// Allocation failure
// ============================================================================

#[test]
fn over_budget_pass_is_skipped_without_leaking() {
    // One 4x4 Argb32 + depth32 mask is 128 bytes; two do not fit.
    let (mut pipeline, camera) = setup_with(4, 4, PoolConfig { budget_bytes: Some(200) });
    let first = PassSettings {
        texture_name: "_First".into(),
        ..PassSettings::default_opaque()
    };
    let second = PassSettings {
        texture_name: "_Second".into(),
        ..PassSettings::default_opaque()
    };
    let renderer = FeatureRenderer::new()
        .with_feature(Box::new(MaskRendererFeature::new("mask", &[first, second])));

    let report = renderer.render_camera(
        &mut pipeline,
        &camera,
        &StaticScene::new(),
        &mut SoftwareExecutor::new(),
    );

    assert_eq!(report.executed, vec!["MaskRenderPass: _First".to_owned()]);
    assert_eq!(report.skipped, vec!["MaskRenderPass: _Second".to_owned()]);
    assert!(report.leaked.is_empty());
    // No command of the skipped pass reaches the backend.
    let skipped_scope = RenderCommand::PushDebugGroup("MaskRenderPass: _Second".into());
    assert!(report.position(|c| *c == skipped_scope).is_none());

    let stats = pipeline.pool.stats();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.acquired, stats.released);
}

#[test]
fn partial_setup_is_rolled_back() {
    // Depth pass (64) and filtering (128) fit; scratch (64) does not.
    let (mut pipeline, camera) = setup_with(4, 4, PoolConfig { budget_bytes: Some(200) });
    let camera = camera.with_skybox(Skybox::new(Vec4::ONE, Vec4::ONE));
    let renderer = FeatureRenderer::new().with_feature(Box::new(MaskableRendererFeature::new(
        "maskable",
        MaskableSettings {
            draw_skybox: true,
            ..MaskableSettings::default()
        },
        Box::new(TintCompositor::new(Vec4::X)),
    )));

    let report = renderer.render_camera(
        &mut pipeline,
        &camera,
        &StaticScene::new(),
        &mut SoftwareExecutor::new(),
    );

    assert_eq!(report.executed, vec!["RenderObjectsDepthPass".to_owned()]);
    assert_eq!(report.skipped, vec!["MaskableRenderPass".to_owned()]);
    assert!(report.leaked.is_empty());

    let stats = pipeline.pool.stats();
    assert_eq!(stats.acquired, 2);
    assert_eq!(stats.released, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(pipeline.pool.active_bytes(), 0);
}

#[test]
fn skipped_pass_recovers_next_frame() {
    let (mut pipeline, camera) = setup_with(4, 4, PoolConfig { budget_bytes: Some(100) });
    let renderer = FeatureRenderer::new().with_feature(Box::new(MaskRendererFeature::new(
        "mask",
        &[PassSettings::default_opaque()],
    )));

    let report = renderer.render_camera(
        &mut pipeline,
        &camera,
        &StaticScene::new(),
        &mut SoftwareExecutor::new(),
    );
    assert_eq!(report.skipped.len(), 1);

    // Nothing is retried within the frame, but a smaller camera fits later.
    let small = common::import_camera(&mut pipeline, "small", 2, 2);
    pipeline.begin_frame();
    let report = renderer.render_camera(
        &mut pipeline,
        &small,
        &StaticScene::new(),
        &mut SoftwareExecutor::new(),
    );
    assert_eq!(report.executed.len(), 1);
    assert!(report.skipped.is_empty());
}

// ============================================================================
// Missing override shaders
// ============================================================================

#[test]
fn missing_threshold_shader_skips_composite_only() {
    let (pipeline, camera) = setup(4, 4);
    let mut pipeline =
        pipeline.with_materials(MaterialLibrary::with_all().without(OverrideShader::StepThreshold));
    let camera = camera.with_skybox(Skybox::new(Vec4::ONE, Vec4::ONE));
    let renderer = FeatureRenderer::new().with_feature(Box::new(MaskableRendererFeature::new(
        "maskable",
        MaskableSettings {
            draw_skybox: true,
            ..MaskableSettings::default()
        },
        Box::new(TintCompositor::new(Vec4::X)),
    )));

    let report = renderer.render_camera(
        &mut pipeline,
        &camera,
        &StaticScene::new(),
        &mut SoftwareExecutor::new(),
    );

    assert_eq!(report.executed, vec!["RenderObjectsDepthPass".to_owned()]);
    assert_eq!(report.skipped, vec!["MaskableRenderPass".to_owned()]);
    // Resolution happens before any acquire.
    assert_eq!(pipeline.pool.stats().acquired, 1);
    assert!(report.leaked.is_empty());
}

#[test]
fn missing_depth_blit_shader_fails_mask_setup() {
    let (mut pipeline, camera) = setup(4, 4);
    let materials = MaterialLibrary::with_all().without(OverrideShader::BlitToDepth);
    let pass = MaskPass::new(&PassSettings::default_opaque());

    let mut ctx = SetupContext::new(&camera, &materials, &mut pipeline.pool);
    let err = pass.setup(&mut ctx).unwrap_err();
    assert!(matches!(err, MaskError::MissingShader(_)));
    assert!(ctx.acquired().is_empty());
}

// ============================================================================
// Cleanup contract
// ============================================================================

#[test]
fn cleanup_without_command_context_is_reported_as_leak() {
    let (mut pipeline, camera) = setup(4, 4);
    let pass = MaskPass::new(&PassSettings::default_opaque());

    let frame = {
        let mut ctx = SetupContext::new(&camera, &pipeline.materials, &mut pipeline.pool);
        pass.setup(&mut ctx).unwrap()
    };
    let err = pass.cleanup(frame, None).unwrap_err();
    assert!(matches!(
        err,
        MaskError::MissingCommandContext(ref name) if name == "MaskRenderPass: _MyTexture"
    ));

    match pipeline.pool.end_frame() {
        Err(MaskError::ResourceLeak(names)) => assert_eq!(names, ["_MyTexture"]),
        other => panic!("expected leak, got {other:?}"),
    }
    // Force-released: the next frame starts clean.
    assert!(pipeline.pool.end_frame().is_ok());
    assert!(pipeline.pool.outstanding().is_empty());
}

#[test]
fn cleanup_records_one_release_per_acquire() {
    let (mut pipeline, camera) = setup(4, 4);
    let pass = MaskPass::new(&PassSettings::default_opaque());

    let frame = {
        let mut ctx = SetupContext::new(&camera, &pipeline.materials, &mut pipeline.pool);
        pass.setup(&mut ctx).unwrap()
    };
    let handle = frame.buffer(BufferRole::Color).unwrap();

    let mut cmd = CommandBuffer::new("cleanup");
    pass.cleanup(frame, Some(&mut cmd)).unwrap();
    assert_eq!(cmd.commands(), [RenderCommand::ReleaseTemporary(handle)]);
}

// ============================================================================
// Execute and backend failures
// ============================================================================

/// Acquires a buffer, records a draw, then fails.
struct BrokenPass;

impl RenderNode for BrokenPass {
    fn name(&self) -> &str {
        "BrokenPass"
    }

    fn event(&self) -> RenderPassEvent {
        RenderPassEvent::AfterRenderingOpaques
    }

    fn setup(&self, ctx: &mut SetupContext) -> mask_passes::Result<PassFrame> {
        let desc = ctx.camera.target;
        let handle = ctx.acquire("_Broken", &desc)?;
        let mut frame = PassFrame::new();
        frame.add_buffer(BufferRole::Color, handle);
        frame.configure_target(handle);
        frame.configure_clear(ClearConfig::ALL);
        Ok(frame)
    }

    fn execute(&self, _frame: &PassFrame, ctx: &mut ExecuteContext) -> mask_passes::Result<()> {
        ctx.cmd.draw_skybox();
        Err(MaskError::InvalidTarget("broken on purpose".to_owned()))
    }
}

#[test]
fn failed_execute_discards_commands_but_releases() {
    let (mut pipeline, camera) = setup(4, 4);
    let broken = BrokenPass;
    let mut builder = FrameBuilder::new();
    builder.add_node(&broken);
    let graph = builder.build();

    let culling = StaticScene::new().cull(&camera);
    let report = graph.execute(
        &mut pipeline,
        &camera,
        &culling,
        &mut SoftwareExecutor::new(),
        |_| {},
    );

    assert_eq!(report.skipped, vec!["BrokenPass".to_owned()]);
    assert!(report.executed.is_empty());
    assert!(report.position(|c| matches!(c, RenderCommand::DrawSkybox)).is_none());
    assert!(matches!(
        report.commands.as_slice(),
        [RenderCommand::ReleaseTemporary(_)]
    ));
    assert!(report.leaked.is_empty());
}

/// Backend that accepts nothing.
struct OfflineExecutor {
    calls: usize,
}

impl CommandExecutor for OfflineExecutor {
    fn execute(
        &mut self,
        _cmd: &CommandBuffer,
        _target: &mut ExecuteTarget<'_>,
    ) -> mask_passes::Result<()> {
        self.calls += 1;
        Err(MaskError::InvalidTarget("device lost".to_owned()))
    }
}

#[test]
fn rejected_release_surfaces_as_leak() {
    let (mut pipeline, camera) = setup(4, 4);
    let renderer = FeatureRenderer::new().with_feature(Box::new(MaskRendererFeature::new(
        "mask",
        &[PassSettings::default_opaque()],
    )));
    let mut executor = OfflineExecutor { calls: 0 };

    let report = renderer.render_camera(&mut pipeline, &camera, &StaticScene::new(), &mut executor);

    // One submission for execute, one for cleanup.
    assert_eq!(executor.calls, 2);
    assert_eq!(report.skipped, ["MaskRenderPass: _MyTexture"]);
    // Rejected submissions are still listed in the report.
    let group = report.position(
        |c| matches!(c, RenderCommand::PushDebugGroup(label) if label == "MaskRenderPass: _MyTexture"),
    );
    let release = report.position(|c| matches!(c, RenderCommand::ReleaseTemporary(_)));
    assert!(group.is_some());
    assert!(group < release);
    assert_eq!(report.leaked, ["_MyTexture"]);
    assert!(pipeline.pool.outstanding().is_empty());
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn renderer_built_from_json_config() -> anyhow::Result<()> {
    common::init_logger();
    let config = FeatureConfig::from_json_str(
        r#"{
            "step_threshold": { "version": 1, "threshold": 0.25 },
            "mask_passes": [ { "texture_name": "_Selection" } ],
            "maskable": {
                "draw_skybox": true,
                "compositor": { "kind": "tint", "color": [1, 0, 0, 1] }
            }
        }"#,
    )?;

    let mut pipeline = config.build_pipeline();
    let camera = common::import_camera(&mut pipeline, "main", 4, 8);
    let camera = camera.with_skybox(Skybox::new(
        Vec4::new(0.2, 0.4, 0.8, 1.0),
        Vec4::new(0.9, 0.9, 0.9, 0.0),
    ));
    let renderer = config.build_renderer();
    let mut executor = config.build_executor();
    assert_eq!(executor.contract().threshold, 0.25);

    let mut scene = StaticScene::new();
    scene.add(quad(1, 0, 6, 0.5));

    let mut selection = 0;
    let reports = renderer.render_frame_with(
        &mut pipeline,
        std::slice::from_ref(&camera),
        &scene,
        &mut executor,
        |ctx| selection = ctx.read_global("_Selection").map_or(0, covered),
    );
    assert_eq!(reports[0].executed.len(), 3);
    assert_eq!(selection, 4);

    // Rows 0..=5 pass the lowered threshold; the quad adds 4 pixels below.
    let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
    let color = pipeline.pool.buffer(camera.color_target)?;
    assert_eq!(color.count_color(|c| c == red), 4 * 6 + 4);
    Ok(())
}

#[test]
fn config_round_trips_through_json() -> anyhow::Result<()> {
    let config = FeatureConfig {
        mask_passes: vec![PassSettings::default_transparent()],
        ..FeatureConfig::default()
    };
    let text = config.to_json_string()?;
    assert_eq!(FeatureConfig::from_json_str(&text)?, config);
    Ok(())
}
