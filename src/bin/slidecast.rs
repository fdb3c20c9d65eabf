use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use slidecast::{
    Compositor, DisplaySurface, Ease, EaseId, EasingRegistry, EventLog, LayerParams,
    PngSequenceDisplay, PresentationConfig, PresentationThread, PresentationThreadOpts, Presenter,
    Slide, SlideDef, TextRasterizer, TransitionEvent, TransitionKind, TransitionSpec, load_slide,
    parse_transition, write_png,
};

#[derive(Parser, Debug)]
#[command(name = "slidecast", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one slide as a PNG.
    Frame(FrameArgs),
    /// Play a scripted show into a PNG sequence.
    Play(PlayArgs),
    /// List the built-in easing curves.
    Easings,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input slide JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Presentation config JSON (defaults apply when omitted).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the output width.
    #[arg(long)]
    width: Option<u32>,

    /// Override the output height.
    #[arg(long)]
    height: Option<u32>,

    /// Transition progress in `[0, 1]`.
    #[arg(long, default_value_t = 1.0)]
    progress: f32,

    /// Transition kind (`cut`, `fade`, `wipe`, `push`) or a JSON transition spec.
    #[arg(long, default_value = "cut")]
    transition: String,

    /// Media time in seconds.
    #[arg(long, default_value_t = 0.0)]
    media_time: f64,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Input show JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory receiving `frame_000000.png`, ...
    #[arg(long)]
    out_dir: PathBuf,

    /// Drive the presentation thread in real time instead of a synthetic clock.
    #[arg(long, default_value_t = false)]
    realtime: bool,

    /// Override the config fps.
    #[arg(long)]
    fps: Option<f64>,
}

/// A scripted show: config, named slides and timed steps.
#[derive(serde::Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct Show {
    #[serde(default)]
    config: PresentationConfig,
    slides: BTreeMap<String, SlideRef>,
    steps: Vec<Step>,
    /// Show length; defaults to 500ms after the last step.
    #[serde(default)]
    end_ms: Option<u64>,
}

#[derive(serde::Deserialize, Debug)]
#[serde(untagged)]
enum SlideRef {
    Path(PathBuf),
    Inline(SlideDef),
}

#[derive(serde::Deserialize, Debug)]
#[serde(untagged)]
enum EasingRef {
    Id(u16),
    Name(String),
}

#[derive(serde::Deserialize, Debug)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Step {
    Send {
        at_ms: u64,
        slide: String,
        #[serde(default)]
        duration_ms: Option<u64>,
        #[serde(default)]
        easing: Option<EasingRef>,
        #[serde(default)]
        transition: Option<TransitionSpec>,
    },
    Clear {
        at_ms: u64,
        #[serde(default)]
        duration_ms: Option<u64>,
        #[serde(default)]
        easing: Option<EasingRef>,
        #[serde(default)]
        transition: Option<TransitionSpec>,
    },
}

impl Step {
    fn at(&self) -> Duration {
        match self {
            Self::Send { at_ms, .. } | Self::Clear { at_ms, .. } => Duration::from_millis(*at_ms),
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Play(args) => cmd_play(args),
        Command::Easings => cmd_easings(),
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("SLIDECAST_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PresentationConfig> {
    match path {
        Some(p) => Ok(PresentationConfig::from_json_path(p)?),
        None => Ok(PresentationConfig::default()),
    }
}

fn text_rasterizer(cfg: &PresentationConfig) -> TextRasterizer {
    let dirs: Vec<&Path> = cfg.font_dirs.iter().map(PathBuf::as_path).collect();
    TextRasterizer::with_fonts(cfg.system_fonts, &dirs)
}

fn parse_transition_arg(s: &str) -> anyhow::Result<TransitionKind> {
    let spec = if s.trim_start().starts_with('{') {
        serde_json::from_str(s).context("parse --transition JSON")?
    } else {
        TransitionSpec {
            kind: s.to_owned(),
            params: serde_json::Value::Null,
        }
    };
    Ok(parse_transition(&spec)?)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(args.config.as_deref())?;
    if let Some(w) = args.width {
        cfg.canvas.width = w;
    }
    if let Some(h) = args.height {
        cfg.canvas.height = h;
    }
    cfg.validate()?;

    let slide = load_slide(&args.in_path)
        .with_context(|| format!("load slide '{}'", args.in_path.display()))?;
    let params = LayerParams {
        progress: args.progress,
        effect: parse_transition_arg(&args.transition)?,
        media_time: args.media_time,
    };

    let mut compositor = Compositor::new(cfg.cache, text_rasterizer(&cfg));
    let surface = compositor.composite(
        &slide,
        params,
        cfg.canvas.width,
        cfg.canvas.height,
        cfg.clear_color.to_rgba8_premul(),
    )?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    write_png(&args.out, &surface.to_frame())?;

    let stats = compositor.stats();
    if stats.component_failures > 0 {
        eprintln!("{} component(s) failed to render", stats.component_failures);
    }
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

struct Script {
    slides: BTreeMap<String, Arc<Slide>>,
    steps: Vec<Step>,
    end: Duration,
    registry: EasingRegistry,
    default_ease: Ease,
    default_effect: TransitionKind,
    default_in: Duration,
    default_out: Duration,
}

impl Script {
    fn load(path: &Path, fps: Option<f64>) -> anyhow::Result<(PresentationConfig, Self)> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read show '{}'", path.display()))?;
        let mut show: Show = serde_json::from_str(&text)
            .with_context(|| format!("parse show '{}'", path.display()))?;
        if let Some(fps) = fps {
            show.config.fps = fps;
        }
        show.config.validate()?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));

        let mut slides = BTreeMap::new();
        for (name, r) in &show.slides {
            let slide = match r {
                SlideRef::Path(p) => load_slide(&root.join(p)),
                SlideRef::Inline(def) => def.build_slide(root),
            }
            .with_context(|| format!("load slide '{name}'"))?;
            slides.insert(name.clone(), Arc::new(slide));
        }

        let registry = EasingRegistry::builtin();
        let default_ease = registry
            .get(show.config.default_easing)
            .with_context(|| format!("unknown default easing {}", show.config.default_easing.0))?;
        let mut steps = show.steps;
        steps.sort_by_key(Step::at);
        let last_step = steps.last().map_or(Duration::ZERO, Step::at);
        let end = show
            .end_ms
            .map(Duration::from_millis)
            .unwrap_or(last_step + Duration::from_millis(500));

        let script = Self {
            slides,
            end,
            default_ease,
            default_effect: parse_transition(&show.config.transition)?,
            default_in: show.config.default_in(),
            default_out: show.config.default_out(),
            registry,
            steps,
        };
        Ok((show.config, script))
    }

    fn ease(&self, r: Option<&EasingRef>) -> anyhow::Result<Ease> {
        Ok(match r {
            None => self.default_ease,
            Some(EasingRef::Id(id)) => self.registry.get_or(EaseId(*id), self.default_ease),
            Some(EasingRef::Name(n)) => self
                .registry
                .by_name(n)
                .with_context(|| format!("unknown easing '{n}'"))?,
        })
    }

    fn effect(&self, t: Option<&TransitionSpec>) -> anyhow::Result<TransitionKind> {
        Ok(match t {
            None => self.default_effect,
            Some(spec) => parse_transition(spec)?,
        })
    }

    fn event(&self, step: &Step) -> anyhow::Result<TransitionEvent> {
        Ok(match step {
            Step::Send {
                slide,
                duration_ms,
                easing,
                transition,
                ..
            } => {
                let s = self
                    .slides
                    .get(slide)
                    .with_context(|| format!("step references unknown slide '{slide}'"))?;
                TransitionEvent::send(
                    s.clone(),
                    duration_ms.map_or(self.default_in, Duration::from_millis),
                    self.ease(easing.as_ref())?,
                    self.effect(transition.as_ref())?,
                )
            }
            Step::Clear {
                duration_ms,
                easing,
                transition,
                ..
            } => TransitionEvent::clear(
                duration_ms.map_or(self.default_out, Duration::from_millis),
                self.ease(easing.as_ref())?,
                self.effect(transition.as_ref())?,
            ),
        })
    }
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let (cfg, script) = Script::load(&args.in_path, args.fps)?;
    let events = script
        .steps
        .iter()
        .map(|s| Ok((s.at(), script.event(s)?)))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let log = EventLog::new();
    let mut presenter = Presenter::with_text(
        cfg.clone(),
        script.registry.clone(),
        text_rasterizer(&cfg),
    )?;
    presenter.add_listener(Box::new(log.clone()));
    let display = PngSequenceDisplay::new(&args.out_dir);

    if args.realtime {
        play_realtime(presenter, display, &cfg, events, script.end, &log)
    } else {
        play_synthetic(presenter, display, &cfg, events, script.end, &log)
    }
}

fn print_events(log: &EventLog, at: Duration) {
    for ev in log.take() {
        println!("{:>7}ms  {ev}", at.as_millis());
    }
}

fn play_synthetic(
    mut presenter: Presenter,
    mut display: PngSequenceDisplay,
    cfg: &PresentationConfig,
    events: Vec<(Duration, TransitionEvent)>,
    end: Duration,
    log: &EventLog,
) -> anyhow::Result<()> {
    let interval = cfg.frame_interval();
    let frames = end.as_nanos().div_ceil(interval.as_nanos().max(1)).max(1) as u64;
    let t0 = Instant::now();
    let mut pending = events.into_iter().peekable();

    display.begin(presenter.canvas())?;
    for i in 0..frames {
        let at = interval * i as u32;
        while let Some((_, ev)) = pending.next_if(|(when, _)| *when <= at) {
            presenter.send_event(ev, t0 + at);
        }
        let frame = presenter.render(t0 + at)?.to_frame();
        display.present(&frame)?;
        print_events(log, at);
    }
    display.end()?;

    let st = presenter.stats();
    eprintln!(
        "wrote {} frames to {} (cache hits {}, builds {}, live {})",
        display.written(),
        display.dir().display(),
        st.cache_hits,
        st.cache_builds,
        st.live_renders
    );
    Ok(())
}

fn play_realtime(
    presenter: Presenter,
    display: PngSequenceDisplay,
    cfg: &PresentationConfig,
    events: Vec<(Duration, TransitionEvent)>,
    end: Duration,
    log: &EventLog,
) -> anyhow::Result<()> {
    let dir = display.dir().to_path_buf();
    let th = PresentationThread::spawn(
        presenter,
        Box::new(display),
        PresentationThreadOpts::from_config(cfg),
    )?;
    let t0 = Instant::now();
    for (at, ev) in events {
        std::thread::sleep((t0 + at).saturating_duration_since(Instant::now()));
        th.send_event(ev)?;
        print_events(log, t0.elapsed());
    }
    std::thread::sleep((t0 + end).saturating_duration_since(Instant::now()));
    let status = th.status();
    let presenter = th.stop()?;
    print_events(log, t0.elapsed());

    let st = presenter.stats();
    eprintln!(
        "presented {} of {} frames to {} (cache hits {}, builds {}, live {})",
        status.frames_presented,
        status.frames_rendered,
        dir.display(),
        st.cache_hits,
        st.cache_builds,
        st.live_renders
    );
    Ok(())
}

fn cmd_easings() -> anyhow::Result<()> {
    let registry = EasingRegistry::builtin();
    for (id, ease) in registry.iter() {
        println!("{:>4}  {}", id.0, ease.name());
    }
    Ok(())
}
