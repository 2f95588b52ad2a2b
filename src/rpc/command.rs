//! Command encoding: user download intents to wire-shaped payloads.
//!
//! The service accepts downloader CLI arguments as a single free-form
//! string. Before a command goes on the wire that string is decomposed:
//! an embedded output flag (`-o <target>`) becomes the payload's rename
//! field, and the rest is tokenized shell-style (quoted substrings stay
//! atomic, quotes stripped) into the `Params` list.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::wire::Method;

/// Splits on whitespace while keeping single- or double-quoted substrings
/// atomic. Same pattern the service's own clients use.
static ARG_TOKEN: LazyLock<regex::Regex> = LazyLock::new(|| {
    // Pattern is a compile-time constant
    #[allow(clippy::unwrap_used)]
    let re = regex::Regex::new(r#"[^\s"']+|"([^"]*)"|'([^']*)'"#).unwrap();
    re
});

/// Query marker after which a single-video URL carries playlist context
const PLAYLIST_MARKER: &str = "?list";

/// Output/rename flag embedded in raw argument strings
const OUTPUT_FLAG: &str = "-o";

/// A user-facing download intent, before wire encoding
#[derive(Clone, Debug, Default)]
pub struct DownloadCommand {
    /// Media or playlist URL; an empty URL makes the command a no-op
    pub url: String,

    /// Raw CLI-style argument string, possibly embedding an output flag
    pub raw_args: String,

    /// Server-side destination directory override
    pub path_override: Option<String>,

    /// Explicit rename target; takes precedence over a rename embedded in
    /// `raw_args`
    pub rename_to: Option<String>,

    /// Whether to download the whole playlist rather than a single item
    pub playlist: bool,

    /// Group the output under a per-channel folder
    pub channel_folder: Option<String>,

    /// Preferred container formats, in order
    pub preferred_formats: Vec<String>,

    /// Preferred quality labels, in order
    pub preferred_qualities: Vec<String>,
}

/// Wire shape of the download request parameter object
///
/// Optional fields are omitted entirely when absent; the server treats a
/// present-but-empty field differently from a missing one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DownloadPayload {
    /// Target URL
    #[serde(rename = "URL")]
    pub url: String,

    /// Sanitized CLI argument tokens
    #[serde(rename = "Params")]
    pub params: Vec<String>,

    /// Destination directory override
    #[serde(default, rename = "Path", skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Output rename target
    #[serde(default, rename = "Rename", skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,

    /// Per-channel output folder
    #[serde(
        default,
        rename = "ChannelFolder",
        skip_serializing_if = "Option::is_none"
    )]
    pub channel_folder: Option<String>,

    /// Preferred container formats
    #[serde(
        default,
        rename = "PreferredFormats",
        skip_serializing_if = "Option::is_none"
    )]
    pub preferred_formats: Option<Vec<String>>,

    /// Preferred quality labels
    #[serde(
        default,
        rename = "PreferredQualities",
        skip_serializing_if = "Option::is_none"
    )]
    pub preferred_qualities: Option<Vec<String>>,
}

/// Tokenize a raw CLI argument string.
///
/// Whitespace separates tokens; single- or double-quoted substrings are one
/// token with the quotes stripped. Empty tokens are dropped, so `a "b c" 'd'`
/// becomes `["a", "b c", "d"]`.
pub fn sanitize_args(raw: &str) -> Vec<String> {
    ARG_TOKEN
        .captures_iter(raw)
        .filter_map(|cap| {
            let token = cap
                .get(1)
                .or_else(|| cap.get(2))
                .or_else(|| cap.get(0))
                .map(|m| m.as_str().trim().to_string())?;
            if token.is_empty() { None } else { Some(token) }
        })
        .collect()
}

/// Extract the output-flag value from a raw argument string.
///
/// Returns `(rename, remainder)`: the rename target is the first
/// whitespace-delimited token after `-o` with quote characters stripped, and
/// the remainder is `raw` with the flag and that value removed, ready to be
/// re-tokenized by [`sanitize_args`]. Without the flag, `rename` is empty
/// and the remainder equals `raw`.
pub fn extract_rename(raw: &str) -> (String, String) {
    let Some(idx) = raw.find(OUTPUT_FLAG) else {
        return (String::new(), raw.to_string());
    };

    let tail: String = raw[idx..]
        .chars()
        .filter(|c| *c != '\'' && *c != '"')
        .collect();

    let rename = tail
        .split(OUTPUT_FLAG)
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("")
        .split(' ')
        .next()
        .unwrap_or_default()
        .to_string();

    let remainder = if rename.is_empty() {
        raw.replacen(OUTPUT_FLAG, "", 1)
    } else {
        raw.replacen(OUTPUT_FLAG, "", 1).replacen(&rename, "", 1)
    };

    (rename, remainder)
}

/// Encode a download command into its remote method and parameter object.
///
/// Single-item mode truncates the URL at the playlist marker so the server
/// does not expand the whole list; playlist mode keeps it. Optional fields
/// are populated only when non-empty.
pub fn build_download_payload(cmd: &DownloadCommand) -> (Method, DownloadPayload) {
    let (extracted_rename, remainder) = extract_rename(&cmd.raw_args);
    let params = sanitize_args(&remainder);

    let rename = cmd
        .rename_to
        .as_deref()
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .or_else(|| {
            if extracted_rename.is_empty() {
                None
            } else {
                Some(extracted_rename)
            }
        });

    let (method, url) = if cmd.playlist {
        (Method::ExecPlaylist, cmd.url.clone())
    } else {
        let truncated = cmd
            .url
            .split(PLAYLIST_MARKER)
            .next()
            .unwrap_or_default()
            .to_string();
        (Method::Exec, truncated)
    };

    let payload = DownloadPayload {
        url,
        params,
        path: cmd
            .path_override
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(str::to_string),
        rename,
        channel_folder: cmd
            .channel_folder
            .as_deref()
            .filter(|f| !f.is_empty())
            .map(str::to_string),
        preferred_formats: if cmd.preferred_formats.is_empty() {
            None
        } else {
            Some(cmd.preferred_formats.clone())
        },
        preferred_qualities: if cmd.preferred_qualities.is_empty() {
            None
        } else {
            Some(cmd.preferred_qualities.clone())
        },
    };

    (method, payload)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    // --- sanitize_args ---

    #[test]
    fn sanitize_splits_on_whitespace_and_keeps_quoted_segments_atomic() {
        assert_eq!(
            sanitize_args(r#"foo "bar baz" 'qux'"#),
            vec!["foo", "bar baz", "qux"],
            "quoted segments must stay whole with their quotes stripped"
        );
    }

    #[test]
    fn sanitize_handles_mixed_flags_and_values() {
        assert_eq!(
            sanitize_args("-f best --embed-thumbnail"),
            vec!["-f", "best", "--embed-thumbnail"]
        );
    }

    #[test]
    fn sanitize_drops_empty_and_whitespace_only_tokens() {
        assert_eq!(
            sanitize_args(r#"  a   ''  "" b  "#),
            vec!["a", "b"],
            "empty quoted strings and runs of whitespace produce no tokens"
        );
    }

    #[test]
    fn sanitize_of_empty_string_is_empty() {
        assert!(sanitize_args("").is_empty());
    }

    #[test]
    fn sanitize_never_returns_tokens_with_surrounding_whitespace() {
        for token in sanitize_args(" -f  best  -o  out.mp4 ") {
            assert_eq!(
                token,
                token.trim(),
                "token {token:?} must carry no leading/trailing whitespace"
            );
        }
    }

    // --- extract_rename ---

    #[test]
    fn extract_rename_without_flag_returns_raw_unchanged() {
        let (rename, remainder) = extract_rename("-f best");
        assert!(rename.is_empty());
        assert_eq!(remainder, "-f best");
    }

    #[test]
    fn extract_rename_takes_token_after_flag() {
        let (rename, remainder) = extract_rename("-f best -o output.mp4 --no-mtime");
        assert_eq!(rename, "output.mp4");
        assert_eq!(
            sanitize_args(&remainder),
            vec!["-f", "best", "--no-mtime"],
            "flag and value must both be gone from the remainder"
        );
    }

    #[test]
    fn extract_rename_strips_quotes_from_target() {
        let (rename, remainder) = extract_rename(r#"-o 'output.mp4' -f best"#);
        assert_eq!(rename, "output.mp4");
        assert_eq!(sanitize_args(&remainder), vec!["-f", "best"]);
    }

    #[test]
    fn extract_rename_on_flag_only_string_yields_empty_rename() {
        let (rename, remainder) = extract_rename("-o");
        assert!(rename.is_empty(), "a dangling flag has no value to extract");
        assert!(sanitize_args(&remainder).is_empty());
    }

    // --- build_download_payload ---

    fn command(url: &str) -> DownloadCommand {
        DownloadCommand {
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn single_mode_truncates_url_at_playlist_marker() {
        let cmd = command("https://media.example/watch?v=1?list=PL123");
        let (method, payload) = build_download_payload(&cmd);
        assert_eq!(method, Method::Exec);
        assert_eq!(
            payload.url, "https://media.example/watch?v=1",
            "single-video mode must strip the playlist query"
        );
    }

    #[test]
    fn playlist_mode_keeps_marker_and_selects_playlist_method() {
        let cmd = DownloadCommand {
            playlist: true,
            ..command("https://media.example/watch?v=1?list=PL123")
        };
        let (method, payload) = build_download_payload(&cmd);
        assert_eq!(method, Method::ExecPlaylist);
        assert_eq!(payload.url, "https://media.example/watch?v=1?list=PL123");
    }

    #[test]
    fn absent_optional_fields_are_omitted_from_wire_json() {
        let (_, payload) = build_download_payload(&command("https://media.example/v"));
        let json = serde_json::to_value(&payload).unwrap();
        let object = json.as_object().unwrap();

        for absent in [
            "Path",
            "Rename",
            "ChannelFolder",
            "PreferredFormats",
            "PreferredQualities",
        ] {
            assert!(
                !object.contains_key(absent),
                "{absent} must not appear as null/empty noise on the wire"
            );
        }
        assert!(object.contains_key("URL"));
        assert!(object.contains_key("Params"));
    }

    #[test]
    fn embedded_rename_flag_flows_into_payload() {
        let cmd = DownloadCommand {
            raw_args: "-f best -o renamed.mp4".to_string(),
            ..command("https://media.example/v")
        };
        let (_, payload) = build_download_payload(&cmd);
        assert_eq!(payload.rename.as_deref(), Some("renamed.mp4"));
        assert_eq!(payload.params, vec!["-f", "best"]);
    }

    #[test]
    fn explicit_rename_to_overrides_embedded_flag() {
        let cmd = DownloadCommand {
            raw_args: "-o from_args.mp4".to_string(),
            rename_to: Some("explicit.mp4".to_string()),
            ..command("https://media.example/v")
        };
        let (_, payload) = build_download_payload(&cmd);
        assert_eq!(payload.rename.as_deref(), Some("explicit.mp4"));
    }

    #[test]
    fn present_optional_fields_serialize_with_server_casing() {
        let cmd = DownloadCommand {
            path_override: Some("/downloads/music".to_string()),
            channel_folder: Some("SomeChannel".to_string()),
            preferred_formats: vec!["mp4".to_string()],
            preferred_qualities: vec!["1080p".to_string()],
            ..command("https://media.example/v")
        };
        let (_, payload) = build_download_payload(&cmd);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["Path"], "/downloads/music");
        assert_eq!(json["ChannelFolder"], "SomeChannel");
        assert_eq!(json["PreferredFormats"][0], "mp4");
        assert_eq!(json["PreferredQualities"][0], "1080p");
    }
}
