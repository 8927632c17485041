use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;
use trimarshal::host::json::as_host_object;
use trimarshal::polyfile::{read_poly, write_poly};
use trimarshal::svg::{read_svg, PathCfg, DEFAULT_CURVE_SAMPLES};
use trimarshal::{
    MarshalCfg, PlanarGraph, TriangulateOptions, TriangulateResult, Triangulator,
};

mod provenance;

use provenance::Payload;

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Triangulate planar graphs through the trimarshal protocol")]
struct Cmd {
    /// Optional run tag; propagated to provenance and logs
    #[arg(long)]
    tag: Option<String>,

    #[command(subcommand)]
    action: Action,
}

/// How `.svg` inputs are read.
#[derive(Args, Clone, Debug)]
struct SvgArgs {
    /// id of the <path> to use when the document has several
    #[arg(long)]
    path_id: Option<String>,
    /// Points sampled per curve, both ends included
    #[arg(long, default_value_t = DEFAULT_CURVE_SAMPLES)]
    curve_samples: usize,
}

impl Default for SvgArgs {
    fn default() -> Self {
        Self {
            path_id: None,
            curve_samples: DEFAULT_CURVE_SAMPLES,
        }
    }
}

#[derive(Subcommand)]
enum Action {
    /// Triangulate a JSON host object, a .poly file or an SVG path
    Triangulate {
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        svg: SvgArgs,
        /// Triangle-style switches (p, c, Y, Q, z)
        #[arg(long, default_value = "pYQ")]
        switches: String,
        /// Cap on raw values per input field; 0 disables the cap
        #[arg(long)]
        max_field_len: Option<usize>,
        /// Emit `{"vertices": [x, y, 0, ...]}` per triangle corner instead of lists
        #[arg(long)]
        vertices: bool,
        /// Write here (plus a provenance sidecar) instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Convert JSON host objects, .poly files and SVG paths (by extension)
    Convert {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        svg: SvgArgs,
    },
    /// Print a small provenance JSON block; set GIT_COMMIT to pin `code_rev`
    Report,
}

fn main() -> Result<()> {
    SubscriberBuilder::default()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Triangulate {
            input,
            svg,
            switches,
            max_field_len,
            vertices,
            out,
        } => {
            let cfg = MarshalCfg::with_cap(max_field_len);
            triangulate(&input, &svg, &switches, cfg, vertices, out.as_deref(), cmd.tag)
        }
        Action::Convert { input, out, svg } => convert(&input, &svg, &out),
        Action::Report => report(cmd.tag),
    }
}

/// Parsed input file.
enum Input {
    Json(Value),
    /// From a `.poly` file or an SVG path.
    Graph(PlanarGraph),
}

fn has_ext(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn load_input(path: &Path, svg: &SvgArgs) -> Result<Input> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    if has_ext(path, "poly") {
        let graph = read_poly(&text).with_context(|| format!("parsing {}", path.display()))?;
        Ok(Input::Graph(graph))
    } else if has_ext(path, "svg") {
        let cfg = PathCfg {
            curve_samples: svg.curve_samples,
            ..PathCfg::default()
        };
        let graph = read_svg(&text, svg.path_id.as_deref(), &cfg)
            .with_context(|| format!("reading path from {}", path.display()))?;
        tracing::info!(
            points = graph.number_of_points(),
            holes = graph.holelist.len() / 2,
            "flattened SVG path"
        );
        Ok(Input::Graph(graph))
    } else {
        let value =
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        Ok(Input::Json(value))
    }
}

fn run_input(input: &Input, tri: &Triangulator) -> Result<TriangulateResult> {
    let res = match input {
        Input::Json(value) => tri.triangulate(&as_host_object(value)?)?,
        Input::Graph(graph) => tri.triangulate(&graph)?,
    };
    Ok(res)
}

fn triangulate(
    input: &Path,
    svg: &SvgArgs,
    switches: &str,
    cfg: MarshalCfg,
    vertices: bool,
    out: Option<&Path>,
    tag: Option<String>,
) -> Result<()> {
    let options: TriangulateOptions = switches.parse()?;
    tracing::info!(input = %input.display(), switches = %options, tag = ?tag, "triangulate");
    let loaded = load_input(input, svg)?;
    let res = run_input(&loaded, &Triangulator::new(cfg, options))?;
    tracing::info!(
        points = res.number_of_points(),
        triangles = res.number_of_triangles(),
        area = res.total_area(),
        "triangulated"
    );

    let doc = if vertices {
        json!({ "vertices": res.expand_vertices() })
    } else {
        res.to_json()
    };

    let Some(out) = out else {
        println!("{}", serde_json::to_string(&doc)?);
        return Ok(());
    };
    ensure_parent(out)?;
    std::fs::write(out, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", out.display()))?;
    let params = json!({
        "input": input.to_string_lossy(),
        "path_id": svg.path_id,
        "switches": options.switches(),
        "max_field_len": cfg.max_field_len,
        "points": res.number_of_points(),
        "triangles": res.number_of_triangles()
    });
    let sidecar = provenance::write_sidecar(out, Payload::new(params, tag))?;
    tracing::info!(out = %out.display(), sidecar = %sidecar.display(), "wrote result");
    Ok(())
}

fn convert(input: &Path, svg: &SvgArgs, out: &Path) -> Result<()> {
    tracing::info!(input = %input.display(), out = %out.display(), "convert");
    let (graph, from_json) = match load_input(input, svg)? {
        Input::Graph(graph) => (graph, false),
        Input::Json(value) => {
            let graph = serde_json::from_value::<PlanarGraph>(value)
                .with_context(|| format!("{} is not a planar graph object", input.display()))?;
            (graph, true)
        }
    };
    ensure_parent(out)?;
    let text = if has_ext(out, "poly") {
        write_poly(&graph)
    } else if !from_json {
        serde_json::to_string_pretty(&graph)?
    } else {
        bail!(
            "convert writes .poly from JSON, or JSON from .poly/.svg; got {} -> {}",
            input.display(),
            out.display()
        );
    };
    std::fs::write(out, text).with_context(|| format!("writing {}", out.display()))?;
    Ok(())
}

fn report(tag: Option<String>) -> Result<()> {
    let params = json!({
        "default_switches": TriangulateOptions::default().switches(),
        "default_max_field_len": MarshalCfg::default().max_field_len
    });
    let obj = provenance::block(&Payload::new(params, tag), &[]);
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TRIANGLE_JSON: &str =
        r#"{"pointlist": [0, 0, 1, 0, 0, 1], "segmentlist": [0, 1, 1, 2, 2, 0], "holelist": []}"#;

    #[test]
    fn triangulate_writes_result_and_sidecar() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("tri.json");
        std::fs::write(&input, TRIANGLE_JSON).unwrap();
        let out = dir.path().join("out/mesh.json");
        let svg = SvgArgs::default();
        triangulate(&input, &svg, "pYQ", MarshalCfg::default(), false, Some(&out), None).unwrap();

        let res: TriangulateResult =
            serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
        assert_eq!(res.trianglelist.len(), 1);
        assert!(dir.path().join("out/mesh.provenance.json").exists());
    }

    #[test]
    fn vertex_soup_has_three_coords_per_corner() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("tri.json");
        std::fs::write(&input, TRIANGLE_JSON).unwrap();
        let out = dir.path().join("soup.json");
        let svg = SvgArgs::default();
        triangulate(&input, &svg, "pQ", MarshalCfg::default(), true, Some(&out), None).unwrap();
        let doc: Value = serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
        assert_eq!(doc["vertices"].as_array().unwrap().len(), 9);
    }

    #[test]
    fn convert_json_to_poly_and_back() {
        let dir = tempdir().unwrap();
        let json_in = dir.path().join("tri.json");
        let poly = dir.path().join("tri.poly");
        let json_out = dir.path().join("back.json");
        std::fs::write(&json_in, TRIANGLE_JSON).unwrap();
        convert(&json_in, &SvgArgs::default(), &poly).unwrap();
        convert(&poly, &SvgArgs::default(), &json_out).unwrap();
        let original: PlanarGraph = serde_json::from_str(TRIANGLE_JSON).unwrap();
        let back: PlanarGraph =
            serde_json::from_slice(&std::fs::read(&json_out).unwrap()).unwrap();
        assert_eq!(back, original);

        let loaded = load_input(&poly, &SvgArgs::default()).unwrap();
        let res = run_input(&loaded, &Triangulator::default()).unwrap();
        assert_eq!(res.number_of_triangles(), 1);
    }

    #[test]
    fn type_errors_surface_through_anyhow() {
        let loaded = Input::Json(json!({"pointlist": 1, "segmentlist": [], "holelist": []}));
        let err = run_input(&loaded, &Triangulator::default()).unwrap_err();
        assert!(err.to_string().contains("must be an array"), "{err}");
    }

    #[test]
    fn zero_cap_accepts_fields_past_the_cap() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("tri.json");
        std::fs::write(&input, TRIANGLE_JSON).unwrap();
        let capped = MarshalCfg::with_cap(Some(4));
        assert!(triangulate(&input, &SvgArgs::default(), "pQ", capped, false, None, None).is_err());
        let out = dir.path().join("mesh.json");
        triangulate(
            &input,
            &SvgArgs::default(),
            "pQ",
            MarshalCfg::with_cap(Some(0)),
            false,
            Some(&out),
            None,
        ).unwrap();
        assert!(out.exists());
    }

    const TWO_PATHS_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <path id="frame" d="M0 0 L4 0 L4 4 L0 4 Z m1 1 l2 0 l0 2 l-2 0 z"/>
  <path id="blob" d="M0 0 C0 2 2 2 2 0 Z"/>
</svg>"#;

    #[test]
    fn svg_path_is_selected_by_id_and_triangulated() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("shapes.svg");
        std::fs::write(&input, TWO_PATHS_SVG).unwrap();
        let out = dir.path().join("frame.json");

        assert!(load_input(&input, &SvgArgs::default()).is_err());
        let svg = SvgArgs {
            path_id: Some("frame".into()),
            ..SvgArgs::default()
        };
        triangulate(&input, &svg, "pYQ", MarshalCfg::default(), false, Some(&out), None)
            .unwrap();
        let res: TriangulateResult =
            serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
        assert_eq!(res.number_of_triangles(), 8);
        assert!((res.total_area() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn convert_svg_to_poly() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("shapes.svg");
        let poly = dir.path().join("blob.poly");
        std::fs::write(&input, TWO_PATHS_SVG).unwrap();
        let svg = SvgArgs {
            path_id: Some("blob".into()),
            curve_samples: 3,
        };
        convert(&input, &svg, &poly).unwrap();
        let graph = read_poly(&std::fs::read_to_string(&poly).unwrap()).unwrap();
        // Move-to point plus two samples of the curve.
        assert_eq!(graph.number_of_points(), 3);
        assert!(graph.holelist.is_empty());
    }
}
