//! Entry resolution: find the one staged file an importer can parse.

use crate::config::{ConvertOptions, DependencyPolicy};
use crate::error::{ConvertError, ImportFailure};
use crate::registry::FormatRegistry;
use crate::scene::Scene;
use crate::source::FileSource;
use crate::state::ConversionState;

use super::{Candidate, ImportContext, Recognition};

/// A successfully imported entry.
#[derive(Debug)]
pub struct Resolved {
    pub scene: Scene,
    /// Path of the entry file
    pub entry: String,
    /// Id of the importer that parsed it
    pub format: &'static str,
}

/// Probes entry candidates in order and imports the first one recognized.
///
/// Candidates are the source's entries in insertion order. For each, the
/// registry's importers are asked in turn; the first that claims the file
/// decides: a parse ends the search successfully, a failure ends it with
/// that failure. Candidates nobody claims are skipped, so the supply order
/// of a valid file set never matters.
pub struct ImportResolver<'r> {
    registry: &'r FormatRegistry,
    options: &'r ConvertOptions,
}

impl<'r> ImportResolver<'r> {
    pub fn new(registry: &'r FormatRegistry, options: &'r ConvertOptions) -> Self {
        Self { registry, options }
    }

    /// Resolve the entry of `source` and import it.
    pub fn resolve(
        &self,
        source: &dyn FileSource,
        state: &mut ConversionState,
    ) -> Result<Resolved, ConvertError> {
        let count = source.entry_count();
        if count == 0 {
            state.advance(ConversionState::Failed, "no input files");
            return Err(ConvertError::EmptyInput);
        }

        state.advance(
            ConversionState::ProbingEntry,
            &format!("{} candidate(s) from {}", count, source.label()),
        );

        let gates = self.options.gates;
        let mut first_disabled: Option<(&'static str, String)> = None;

        for index in 0..count {
            let Some((path, content)) = source.entry_at(index) else {
                continue;
            };

            if let Some(format) = gates.disabled_format_for(path) {
                log::debug!("Candidate {} matches disabled format {}", path, format);
                first_disabled.get_or_insert_with(|| (format, path.to_string()));
                continue;
            }

            let candidate = Candidate::new(path, content);
            for importer in self.registry.importers() {
                let format = importer.info().id;
                let ctx = ImportContext::new(source, path, gates);

                let recognition = importer.recognize(&candidate, &ctx);
                if matches!(recognition, Recognition::NotRecognized) {
                    continue;
                }

                state.advance(
                    ConversionState::Resolving,
                    &format!("{} claimed by {}", path, format),
                );
                return match self.finish(recognition, &ctx, format, path) {
                    Ok(scene) => {
                        state.advance(
                            ConversionState::Parsed,
                            &format!(
                                "{} meshes, {} materials",
                                scene.mesh_count(),
                                scene.material_count()
                            ),
                        );
                        Ok(Resolved {
                            scene,
                            entry: path.to_string(),
                            format,
                        })
                    }
                    Err(err) => {
                        state.advance(ConversionState::Failed, &err.to_string());
                        Err(err)
                    }
                };
            }

            log::debug!("Candidate {} not recognized", path);
        }

        let err = match first_disabled {
            Some((format, path)) => ConvertError::DisabledFormat {
                format: format.to_string(),
                path,
            },
            None => ConvertError::NoRecognizedEntry { candidates: count },
        };
        state.advance(ConversionState::Failed, &err.to_string());
        Err(err)
    }

    fn finish(
        &self,
        recognition: Recognition,
        ctx: &ImportContext<'_>,
        format: &str,
        path: &str,
    ) -> Result<Scene, ConvertError> {
        let scene = match recognition {
            Recognition::Parsed(scene) => scene,
            Recognition::Failed(failure) => {
                return Err(ConvertError::from_import(failure, format, path))
            }
            Recognition::NotRecognized => {
                return Err(ConvertError::NoRecognizedEntry { candidates: 1 })
            }
        };

        let misses = ctx.misses();
        if let Some(first) = misses.first() {
            match self.options.dependency_policy {
                DependencyPolicy::Strict => {
                    return Err(ConvertError::MissingDependency {
                        reference: first.clone(),
                        requested_by: path.to_string(),
                    });
                }
                DependencyPolicy::Lenient => {
                    for reference in &misses {
                        log::warn!("{} references missing {}, using defaults", path, reference);
                    }
                }
            }
        }

        scene.validate().map_err(|message| {
            ConvertError::from_import(ImportFailure::InvalidScene(message), format, path)
        })?;

        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::import::Importer;
    use crate::registry::FormatInfo;
    use crate::scene::Material;
    use crate::source::FileStore;

    /// Claims `.tst` files: "ok" parses, "dep" needs an optional `dep.txt`,
    /// anything else fails.
    struct TestImporter;

    static TEST_INFO: FormatInfo = FormatInfo {
        id: "tst",
        name: "Test",
        extensions: &["tst"],
    };

    impl Importer for TestImporter {
        fn info(&self) -> &FormatInfo {
            &TEST_INFO
        }

        fn recognize(&self, candidate: &Candidate<'_>, ctx: &ImportContext<'_>) -> Recognition {
            if !TEST_INFO.matches_extension(candidate.path()) {
                return Recognition::NotRecognized;
            }
            let mut scene = Scene::new(candidate.stem());
            scene.add_material(Material::fallback());
            match candidate.content() {
                b"ok" => Recognition::Parsed(scene),
                b"dep" => {
                    ctx.optional("dep.txt");
                    Recognition::Parsed(scene)
                }
                _ => Recognition::Failed(ImportFailure::Parse("bad".into())),
            }
        }
    }

    fn resolve(store: &FileStore, options: &ConvertOptions) -> Result<Resolved, ConvertError> {
        let registry = FormatRegistry::new().with_importer(TestImporter);
        let mut state = ConversionState::Idle;
        ImportResolver::new(&registry, options).resolve(store, &mut state)
    }

    #[test]
    fn test_empty_input() {
        let err = resolve(&FileStore::new(), &ConvertOptions::eager()).unwrap_err();
        assert_eq!(err, ConvertError::EmptyInput);
    }

    #[test]
    fn test_skips_unrecognized_candidates() {
        let store: FileStore = [("notes.txt", b"x".to_vec()), ("a.tst", b"ok".to_vec())]
            .into_iter()
            .collect();
        let resolved = resolve(&store, &ConvertOptions::eager()).unwrap();
        assert_eq!(resolved.entry, "a.tst");
        assert_eq!(resolved.format, "tst");
    }

    #[test]
    fn test_failure_does_not_fall_through() {
        let store: FileStore = [("bad.tst", b"??".to_vec()), ("good.tst", b"ok".to_vec())]
            .into_iter()
            .collect();
        let err = resolve(&store, &ConvertOptions::eager()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RecognizedButFailed);
    }

    #[test]
    fn test_nothing_recognized() {
        let store: FileStore = [("a.png", vec![0x89, b'P']), ("b.txt", vec![])]
            .into_iter()
            .collect();
        let err = resolve(&store, &ConvertOptions::eager()).unwrap_err();
        assert_eq!(err, ConvertError::NoRecognizedEntry { candidates: 2 });
    }

    #[test]
    fn test_earliest_disabled_candidate_reported() {
        let store: FileStore = [
            ("a.txt", vec![]),
            ("b.irr", vec![]),
            ("c.x3d", vec![]),
        ]
        .into_iter()
        .collect();
        let err = resolve(&store, &ConvertOptions::eager()).unwrap_err();
        assert_eq!(
            err,
            ConvertError::DisabledFormat {
                format: "irr".into(),
                path: "b.irr".into(),
            }
        );
    }

    #[test]
    fn test_disabled_candidate_does_not_hide_valid_entry() {
        let store: FileStore = [("b.irr", vec![]), ("a.tst", b"ok".to_vec())]
            .into_iter()
            .collect();
        assert!(resolve(&store, &ConvertOptions::eager()).is_ok());
    }

    #[test]
    fn test_dependency_policy() {
        let store: FileStore = [("a.tst", b"dep".to_vec())].into_iter().collect();

        assert!(resolve(&store, &ConvertOptions::eager()).is_ok());

        let err = resolve(&store, &ConvertOptions::delayed()).unwrap_err();
        assert_eq!(
            err,
            ConvertError::MissingDependency {
                reference: "dep.txt".into(),
                requested_by: "a.tst".into(),
            }
        );
    }
}
