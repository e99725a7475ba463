use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context as _;
use clap::Parser;
use plum_engine::canvas::MAX_DIMENSION;
use plum_engine::coords::{Point, Rect, Vec2};
use plum_engine::device::{Gpu, GpuInit, SharedDevice, SoftwareDevice, WgpuDevice};
use plum_engine::logging::{init_logging, LoggingConfig};
use plum_engine::{Blend, BlendMode, Canvas, Color, Image, RenderCtx, Sprite, Transform};

#[derive(Parser, Debug)]
#[command(name = "plum-viewer", version)]
struct Cli {
    /// Source image; a generated test pattern when omitted.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long, default_value = "plum-demo.png")]
    out: PathBuf,

    #[arg(long, default_value_t = 320, value_parser = output_size())]
    width: u32,

    #[arg(long, default_value_t = 240, value_parser = output_size())]
    height: u32,

    /// Global opacity applied to every blit.
    #[arg(long, default_value_t = 255)]
    opacity: u8,

    /// Render on the GPU instead of the software device.
    #[arg(long, default_value_t = false)]
    gpu: bool,

    /// Log filter (env_logger syntax).
    #[arg(long)]
    log: Option<String>,
}

/// Output dimensions must fit a canvas unclamped.
fn output_size() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=i64::from(MAX_DIMENSION))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..LoggingConfig::default()
    });

    let source = match &cli.in_path {
        Some(path) => {
            Canvas::load(path).with_context(|| format!("load {}", path.display()))?
        }
        None => test_pattern(64, 64),
    };
    let ctx = RenderCtx::new(Blend::Preserve, cli.opacity);

    let frame = if cli.gpu {
        render_gpu(&cli, &source, &ctx)?
    } else {
        render_software(&cli, &source, &ctx)?
    };

    frame
        .save(&cli.out)
        .with_context(|| format!("write {}", cli.out.display()))?;
    log::info!("wrote {} ({}x{})", cli.out.display(), frame.width(), frame.height());
    Ok(())
}

fn render_software(cli: &Cli, source: &Canvas, ctx: &RenderCtx) -> anyhow::Result<Canvas> {
    let device = Rc::new(RefCell::new(SoftwareDevice::new(cli.width, cli.height)));
    device.borrow_mut().target_mut().clear(Color::rgb(24, 24, 32));

    let shared: SharedDevice = device.clone();
    compose_scene(&shared, source, ctx, cli.width, cli.height)?;

    let device = device.borrow();
    log::debug!("{} draws issued", device.draw_log().len());
    Ok(device.target().clone())
}

fn render_gpu(cli: &Cli, source: &Canvas, ctx: &RenderCtx) -> anyhow::Result<Canvas> {
    let gpu = Gpu::headless_blocking(GpuInit::default())?;
    let device = Rc::new(RefCell::new(gpu.blit_device(WgpuDevice::OFFSCREEN_FORMAT)));

    let target = device.borrow().create_render_target(cli.width, cli.height);
    let view = target.create_view(&Default::default());
    device
        .borrow_mut()
        .begin_frame(view, cli.width, cli.height, Some(Color::rgb(24, 24, 32)))?;

    let shared: SharedDevice = device.clone();
    compose_scene(&shared, source, ctx, cli.width, cli.height)?;

    let mut device = device.borrow_mut();
    device.end_frame()?;
    Ok(device.read_back(&target)?)
}

/// Lays out one sample of each blit family across the target.
fn compose_scene(
    device: &SharedDevice,
    source: &Canvas,
    ctx: &RenderCtx,
    width: u32,
    height: u32,
) -> anyhow::Result<()> {
    let image = Image::new(device, source)?;
    let (w, h) = (f64::from(image.width()), f64::from(image.height()));
    let (tw, th) = (f64::from(width), f64::from(height));

    image.blit(ctx, 8.0, 8.0, BlendMode::Unspecified)?;
    image.scale_blit(ctx, w + 16.0, 8.0, w / 2.0, h / 2.0, BlendMode::Merge)?;
    image.rotate_scale_blit(ctx, tw - w - 8.0, 8.0, 30.0, 0.75, BlendMode::Add)?;

    let mirrored = Transform::at(Point::new(8.0, th - h - 8.0))
        .with_pivot(Point::new(w / 2.0, h / 2.0))
        .with_scale(Vec2::new(1.0, 1.0))
        .mirrored(true)
        .with_tint(Color::rgba(255, 200, 120, 200))
        .with_clip(Rect::new(0.0, 0.0, w, h));
    image.transform_blit(ctx, &mirrored)?;

    let frame_w = (image.width() / 4).max(1);
    let frame_h = (image.height() / 4).max(1);
    let sprite = Sprite::new(&image, frame_w, frame_h);
    sprite.bind(ctx, BlendMode::Preserve)?;
    for f in 0..8 {
        let x = w + 16.0 + f64::from(f) * f64::from(frame_w + 2);
        sprite.raw_blit_frame(x, th - f64::from(frame_h) - 8.0, f, f64::from(f) * 15.0, 1.0)?;
    }
    Ok(())
}

/// Hue sweep with a translucent checker, so every blend mode shows.
fn test_pattern(w: u32, h: u32) -> Canvas {
    let mut canvas = Canvas::new(w, h);
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let hue = x * 360 / w as i32;
            let alpha = if (x / 8 + y / 8) % 2 == 0 { 255 } else { 160 };
            canvas.set_pixel(x, y, Color::hsv(hue, 255, 255 - y * 2, alpha));
        }
    }
    canvas
}
