use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use super::{BackendError, ConversionBackend, ConversionRequest, Resolution};

type ConvertFn = dyn Fn(&ConversionRequest) -> Result<String, BackendError> + Send + Sync;

/// In-process conversion through a library call.
///
/// Results are available immediately, so the engine never needs the
/// placeholder-then-notify path with this backend. A panic inside the
/// wrapped function is caught and reported as [`BackendError::Panicked`].
pub struct EmbeddedConversion {
    name: String,
    convert: Box<ConvertFn>,
}

impl fmt::Debug for EmbeddedConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedConversion")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl EmbeddedConversion {
    /// Wrap any pure conversion function.
    pub fn from_fn<F>(name: impl Into<String>, convert: F) -> Self
    where
        F: Fn(&ConversionRequest) -> Result<String, BackendError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            convert: Box::new(convert),
        }
    }

    /// Conversion through the `vidyut-lipi` crate.
    #[cfg(feature = "vidyut")]
    pub fn vidyut() -> Self {
        use std::sync::{Mutex, PoisonError};

        let lipika = Mutex::new(vidyut_lipi::Lipika::new());
        Self::from_fn("vidyut-lipi", move |request| {
            let from = vidyut_scheme(&request.source)?;
            let to = vidyut_scheme(&request.target)?;
            let mut lipika = lipika.lock().unwrap_or_else(PoisonError::into_inner);
            Ok(lipika.transliterate(&request.text, from, to))
        })
    }
}

/// Map a registry identifier to a `vidyut-lipi` scheme via its engine code.
#[cfg(feature = "vidyut")]
fn vidyut_scheme(identifier: &str) -> Result<vidyut_lipi::Scheme, BackendError> {
    use vidyut_lipi::Scheme;

    let unsupported = || BackendError::UnsupportedScript(identifier.to_string());
    let descriptor = crate::script::lookup(identifier).ok_or_else(unsupported)?;
    let scheme = match descriptor.engine_code {
        "Devanagari" => Scheme::Devanagari,
        "Iast" => Scheme::Iast,
        "HarvardKyoto" => Scheme::HarvardKyoto,
        "BarahaSouth" => Scheme::BarahaSouth,
        "Itrans" => Scheme::Itrans,
        "Tamil" => Scheme::Tamil,
        "Telugu" => Scheme::Telugu,
        "Kannada" => Scheme::Kannada,
        "Malayalam" => Scheme::Malayalam,
        "Gujarati" => Scheme::Gujarati,
        "Slp1" => Scheme::Slp1,
        "Velthuis" => Scheme::Velthuis,
        "Wx" => Scheme::Wx,
        _ => return Err(unsupported()),
    };
    Ok(scheme)
}

impl ConversionBackend for EmbeddedConversion {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolution(&self) -> Resolution {
        Resolution::Immediate
    }

    fn convert(&self, request: &ConversionRequest) -> Result<String, BackendError> {
        catch_unwind(AssertUnwindSafe(|| (self.convert)(request)))
            .unwrap_or_else(|payload| Err(BackendError::Panicked(crate::panic_message(&*payload))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> ConversionRequest {
        ConversionRequest {
            text: text.into(),
            source: "baraha".into(),
            target: "iast".into(),
        }
    }

    #[test]
    fn test_from_fn_converts() {
        let backend = EmbeddedConversion::from_fn("upper", |r| Ok(r.text.to_uppercase()));
        assert_eq!(backend.name(), "upper");
        assert_eq!(backend.resolution(), Resolution::Immediate);
        assert_eq!(backend.convert(&request("agni")).unwrap(), "AGNI");
    }

    #[test]
    fn test_error_passed_through() {
        let backend = EmbeddedConversion::from_fn("failing", |r| {
            Err(BackendError::UnsupportedScript(r.target.clone()))
        });
        let err = backend.convert(&request("agni")).unwrap_err();
        assert!(matches!(err, BackendError::UnsupportedScript(ref s) if s == "iast"));
    }

    #[test]
    fn test_panic_becomes_error() {
        let backend = EmbeddedConversion::from_fn("panicky", |_| panic!("mapping table missing"));
        let err = backend.convert(&request("agni")).unwrap_err();
        match err {
            BackendError::Panicked(msg) => assert!(msg.contains("mapping table missing")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(feature = "vidyut")]
    #[test]
    fn test_vidyut_devanagari_to_iast() {
        let backend = EmbeddedConversion::vidyut();
        let out = backend
            .convert(&ConversionRequest {
                text: "संस्कृतम्".into(),
                source: "devanagari".into(),
                target: "iast".into(),
            })
            .unwrap();
        assert_eq!(out, "saṃskṛtam");
    }

    #[cfg(feature = "vidyut")]
    #[test]
    fn test_vidyut_unknown_script() {
        let backend = EmbeddedConversion::vidyut();
        let mut req = request("agni");
        req.target = "klingon".into();
        assert!(matches!(
            backend.convert(&req),
            Err(BackendError::UnsupportedScript(_))
        ));
    }
}
