use anyhow::{bail, Context, Result};
use clap::Parser;
use stagehand_core::{
    convert_file_set, convert_single_file, ConversionResult, FileStore, OutputFile,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Convert 3D model files between formats.
#[derive(Parser, Debug)]
#[command(name = "stagehand", version)]
#[command(after_help = "Targets: assjson, gltf2, glb2, obj, stl")]
struct Cli {
    /// Read only the root file up front and fetch side files on request
    #[arg(long)]
    lazy: bool,

    /// Export format id
    target: String,

    /// Directory the outputs are written to
    out_dir: PathBuf,

    /// Input files; with --lazy, the single root file
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

/// How the input files are handed to the converter.
#[derive(Debug, PartialEq)]
enum Staging<'a> {
    /// Every file read up front.
    Eager(&'a [PathBuf]),
    /// Only the root is read; side files are fetched on request.
    Lazy(&'a Path),
}

impl Cli {
    fn staging(&self) -> Result<Staging<'_>> {
        if !self.lazy {
            return Ok(Staging::Eager(&self.inputs));
        }
        match self.inputs.as_slice() {
            [root] => Ok(Staging::Lazy(root)),
            _ => bail!("--lazy takes exactly one root file, got {}", self.inputs.len()),
        }
    }
}

/// Logical name for a file on disk. Separators are normalized so that
/// relative references inside the files match.
fn logical_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn stage_files(paths: &[PathBuf]) -> Result<FileStore> {
    let mut store = FileStore::new();
    for path in paths {
        let content =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        log::debug!("Staged {} ({} bytes)", path.display(), content.len());
        store.add_file(logical_name(path), content);
    }
    Ok(store)
}

fn convert(cli: &Cli) -> Result<ConversionResult> {
    let result = match cli.staging()? {
        Staging::Eager(paths) => convert_file_set(&stage_files(paths)?, &cli.target),
        Staging::Lazy(root) => {
            let content =
                fs::read(root).with_context(|| format!("Failed to read {}", root.display()))?;
            let base = root.parent().map(Path::to_path_buf).unwrap_or_default();
            let root_name = root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .with_context(|| format!("{} is not a file", root.display()))?;

            convert_single_file(
                &root_name,
                content,
                &cli.target,
                |name| base.join(name).is_file(),
                |name| fs::read(base.join(name)).ok(),
            )
        }
    };
    Ok(result)
}

fn write_outputs(out_dir: &Path, outputs: &[OutputFile]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let mut written = Vec::with_capacity(outputs.len());
    for output in outputs {
        let path = out_dir.join(output.path());
        fs::write(&path, output.content())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote {} ({} bytes)", path.display(), output.content().len());
        written.push(path);
    }
    Ok(written)
}

fn run(cli: &Cli) -> Result<Vec<PathBuf>> {
    let result = convert(cli)?;
    if !result.is_success() {
        bail!("{}", result.diagnostic());
    }
    write_outputs(&cli.out_dir, result.outputs())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let written = run(&cli)?;
    log::info!("Done: {} file(s)", written.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "mtllib tri.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl red\nf 1 2 3\n";
    const MTL: &str = "newmtl red\nKd 1 0 0\n";

    fn cli(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("stagehand").chain(args.iter().copied()))
    }

    fn path_arg(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_parse_eager() {
        let cli = cli(&["gltf2", "out", "a.obj", "a.mtl"]).unwrap();
        assert!(!cli.lazy);
        assert_eq!(cli.target, "gltf2");
        assert_eq!(cli.out_dir, PathBuf::from("out"));

        let inputs = [PathBuf::from("a.obj"), PathBuf::from("a.mtl")];
        assert_eq!(cli.staging().unwrap(), Staging::Eager(&inputs));
    }

    #[test]
    fn test_parse_lazy() {
        let parsed = cli(&["--lazy", "stl", "out", "a.obj"]).unwrap();
        assert_eq!(parsed.staging().unwrap(), Staging::Lazy(Path::new("a.obj")));

        // The flag is accepted after the positionals too
        let trailing = cli(&["stl", "out", "a.obj", "--lazy"]).unwrap();
        assert!(trailing.lazy);

        let two_roots = cli(&["--lazy", "stl", "out", "a.obj", "b.obj"]).unwrap();
        let err = two_roots.staging().unwrap_err();
        assert!(err.to_string().contains("exactly one root file"));
    }

    #[test]
    fn test_parse_rejects_missing_inputs() {
        let err = cli(&["stl", "out"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let err = cli(&["--bogus", "stl", "out", "a.obj"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_eager_conversion_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("tri.obj");
        let mtl = dir.path().join("tri.mtl");
        fs::write(&obj, TRIANGLE).unwrap();
        fs::write(&mtl, MTL).unwrap();
        let out = dir.path().join("out");

        let args = cli(&["gltf2", &path_arg(&out), &path_arg(&obj), &path_arg(&mtl)]).unwrap();
        let written = run(&args).unwrap();

        assert_eq!(written, [out.join("result.gltf"), out.join("result.bin")]);
        assert!(written.iter().all(|p| p.is_file()));
    }

    #[test]
    fn test_lazy_conversion_reads_side_files() {
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("tri.obj");
        fs::write(&obj, TRIANGLE).unwrap();
        let out = dir.path().join("out");
        let args = cli(&["--lazy", "assjson", &path_arg(&out), &path_arg(&obj)]).unwrap();

        // Delayed mode needs the material library
        let err = run(&args).unwrap_err();
        assert!(err.to_string().contains("tri.mtl"));

        fs::write(dir.path().join("tri.mtl"), MTL).unwrap();
        let written = run(&args).unwrap();
        assert_eq!(written, [out.join("result.json")]);
    }

    #[test]
    fn test_missing_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.obj");
        let args = cli(&["stl", &path_arg(dir.path()), &path_arg(&missing)]).unwrap();

        let err = run(&args).unwrap_err();
        assert!(err.to_string().contains("nope.obj"));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
