//! External tool invocations.
//!
//! Each invocation is a program plus a discrete argument vector; nothing is
//! ever composed into a shell string. Secret arguments are kept apart so the
//! rendered command (used in logs and errors) shows `****` in their place.

use crate::keystore::DistinguishedName;
use crate::prompt::Secret;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// One command-line argument.
#[derive(Clone, PartialEq, Eq)]
pub enum ToolArg {
    Plain(OsString),
    /// Rendered as `<prefix>****`, passed as `<prefix><value>`.
    Secret { prefix: &'static str, value: Secret },
}

impl ToolArg {
    /// Value handed to the process.
    pub fn to_os_string(&self) -> OsString {
        match self {
            ToolArg::Plain(v) => v.clone(),
            ToolArg::Secret { prefix, value } => format!("{prefix}{}", value.expose()).into(),
        }
    }
}

impl fmt::Debug for ToolArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolArg::Plain(v) => write!(f, "{:?}", v),
            ToolArg::Secret { prefix, .. } => write!(f, "\"{prefix}****\""),
        }
    }
}

/// A fully specified external tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Short tool name used in logs (`apktool`, `zipalign`, ...).
    pub tool: &'static str,

    /// Executable to spawn.
    pub program: PathBuf,

    args: Vec<ToolArg>,
}

impl ToolInvocation {
    pub fn new(tool: &'static str, program: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(ToolArg::Plain(arg.as_ref().to_os_string()));
        self
    }

    pub fn secret_arg(mut self, prefix: &'static str, value: &Secret) -> Self {
        self.args.push(ToolArg::Secret {
            prefix,
            value: value.clone(),
        });
        self
    }

    pub fn args(&self) -> &[ToolArg] {
        &self.args
    }

    /// Arguments as handed to the process, secrets included.
    pub fn process_args(&self) -> Vec<OsString> {
        self.args.iter().map(ToolArg::to_os_string).collect()
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            match arg {
                ToolArg::Plain(v) => {
                    let v = v.to_string_lossy();
                    if v.is_empty() || v.contains(char::is_whitespace) {
                        write!(f, " \"{v}\"")?;
                    } else {
                        write!(f, " {v}")?;
                    }
                }
                ToolArg::Secret { prefix, .. } => write!(f, " {prefix}****")?,
            }
        }
        Ok(())
    }
}

/// `apktool d <input> -o <output> -f`
pub fn apktool_decode(apktool: &Path, input: &Path, output: &Path) -> ToolInvocation {
    ToolInvocation::new("apktool", apktool)
        .arg("d")
        .arg(input)
        .arg("-o")
        .arg(output)
        .arg("-f")
}

/// `apktool b <input_dir> -o <output> --use-aapt2`
pub fn apktool_build(apktool: &Path, input_dir: &Path, output: &Path) -> ToolInvocation {
    ToolInvocation::new("apktool", apktool)
        .arg("b")
        .arg(input_dir)
        .arg("-o")
        .arg(output)
        .arg("--use-aapt2")
}

/// `zipalign -p -f 4 <input> <output>`
pub fn zipalign(zipalign: &Path, input: &Path, output: &Path) -> ToolInvocation {
    ToolInvocation::new("zipalign", zipalign)
        .arg("-p")
        .arg("-f")
        .arg("4")
        .arg(input)
        .arg(output)
}

/// Arguments for a new RSA-2048 key pair.
#[derive(Debug, Clone)]
pub struct GenKeyPair<'a> {
    pub alias: &'a str,
    pub validity_days: u32,
    pub keystore: &'a Path,
    pub store_password: &'a Secret,
    pub key_password: &'a Secret,
    pub dname: &'a DistinguishedName,
}

/// `keytool -genkeypair ... -keystore <ks> -noprompt -storepass .. -keypass .. -dname ..`
pub fn keytool_genkeypair(keytool: &Path, req: &GenKeyPair<'_>) -> ToolInvocation {
    ToolInvocation::new("keytool", keytool)
        .arg("-genkeypair")
        .arg("-alias")
        .arg(req.alias)
        .arg("-keyalg")
        .arg("RSA")
        .arg("-keysize")
        .arg("2048")
        .arg("-validity")
        .arg(req.validity_days.to_string())
        .arg("-keystore")
        .arg(req.keystore)
        .arg("-noprompt")
        .arg("-storepass")
        .secret_arg("", req.store_password)
        .arg("-keypass")
        .secret_arg("", req.key_password)
        .arg("-dname")
        .arg(req.dname.to_string())
}

/// `apksigner sign --ks <ks> --ks-key-alias <alias> --ks-pass pass:.. --key-pass pass:.. --out <out> <in>`
pub fn apksigner_sign(
    apksigner: &Path,
    keystore: &Path,
    alias: &str,
    store_password: &Secret,
    key_password: &Secret,
    input: &Path,
    output: &Path,
) -> ToolInvocation {
    ToolInvocation::new("apksigner", apksigner)
        .arg("sign")
        .arg("--ks")
        .arg(keystore)
        .arg("--ks-key-alias")
        .arg(alias)
        .arg("--ks-pass")
        .secret_arg("pass:", store_password)
        .arg("--key-pass")
        .secret_arg("pass:", key_password)
        .arg("--out")
        .arg(output)
        .arg(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(inv: &ToolInvocation) -> Vec<String> {
        inv.process_args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_apktool_decode_args() {
        let inv = apktool_decode(
            Path::new("/opt/apktool"),
            Path::new("in/app.apk"),
            Path::new("output/app-decompiled"),
        );
        assert_eq!(inv.tool, "apktool");
        assert_eq!(
            plain(&inv),
            vec!["d", "in/app.apk", "-o", "output/app-decompiled", "-f"]
        );
        assert_eq!(
            inv.to_string(),
            "/opt/apktool d in/app.apk -o output/app-decompiled -f"
        );
    }

    #[test]
    fn test_apktool_build_and_zipalign_args() {
        let build = apktool_build(
            Path::new("apktool"),
            Path::new("output/app-decompiled"),
            Path::new("output/app-unsigned.apk"),
        );
        assert_eq!(
            plain(&build),
            vec![
                "b",
                "output/app-decompiled",
                "-o",
                "output/app-unsigned.apk",
                "--use-aapt2"
            ]
        );

        let align = zipalign(
            Path::new("sdk/zipalign"),
            Path::new("output/app-unsigned.apk"),
            Path::new("output/app-zipaligned.apk"),
        );
        assert_eq!(
            plain(&align),
            vec![
                "-p",
                "-f",
                "4",
                "output/app-unsigned.apk",
                "output/app-zipaligned.apk"
            ]
        );
    }

    #[test]
    fn test_paths_with_spaces_stay_single_arguments() {
        let inv = apktool_decode(
            Path::new("apktool"),
            Path::new("my apps/app; rm -rf ~.apk"),
            Path::new("output/app-decompiled"),
        );
        assert_eq!(plain(&inv)[1], "my apps/app; rm -rf ~.apk");
        assert!(inv.to_string().contains("\"my apps/app; rm -rf ~.apk\""));
    }

    #[test]
    fn test_apksigner_redacts_passwords() {
        let store = Secret::new("store-secret");
        let key = Secret::new("key-secret");
        let inv = apksigner_sign(
            Path::new("sdk/apksigner"),
            Path::new("release.keystore"),
            "release",
            &store,
            &key,
            Path::new("output/app-zipaligned.apk"),
            Path::new("output/app-signed.apk"),
        );

        let args = plain(&inv);
        assert_eq!(
            args,
            vec![
                "sign",
                "--ks",
                "release.keystore",
                "--ks-key-alias",
                "release",
                "--ks-pass",
                "pass:store-secret",
                "--key-pass",
                "pass:key-secret",
                "--out",
                "output/app-signed.apk",
                "output/app-zipaligned.apk"
            ]
        );

        let rendered = inv.to_string();
        assert!(rendered.contains("--ks-pass pass:****"));
        assert!(!rendered.contains("store-secret"));
        assert!(!format!("{:?}", inv).contains("key-secret"));
    }

    #[test]
    fn test_keytool_genkeypair_args() {
        let pw = Secret::new("changeit");
        let dname = DistinguishedName {
            common_name: "Jane Doe".to_string(),
            organisational_unit: "Mobile".to_string(),
            organisation: "Acme".to_string(),
            locality: "Berlin".to_string(),
            state: "Berlin".to_string(),
            country: "DE".to_string(),
        };
        let inv = keytool_genkeypair(
            Path::new("keytool"),
            &GenKeyPair {
                alias: "release",
                validity_days: 10000,
                keystore: Path::new("output/release.keystore"),
                store_password: &pw,
                key_password: &pw,
                dname: &dname,
            },
        );

        let args = plain(&inv);
        assert_eq!(args[0], "-genkeypair");
        assert!(args.contains(&"10000".to_string()));
        assert!(args.contains(&"output/release.keystore".to_string()));
        assert_eq!(
            args.last().unwrap(),
            "CN=Jane Doe, OU=Mobile, O=Acme, L=Berlin, S=Berlin, C=DE"
        );
        assert!(!inv.to_string().contains("changeit"));
    }
}
