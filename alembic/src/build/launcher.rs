// SPDX-FileCopyrightText: Copyright © 2024-2025 Alembic Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::Path;

/// Typed template for the entry-point launcher.
///
/// Two identical launchers are written per install — one under `bin/`
/// for the shell search path, one inside the bundle's `MacOS/`
/// directory for the desktop launcher — so the body must be a pure
/// function of these fields.
#[derive(Debug, Clone, Copy)]
pub struct Launcher<'a> {
    pub interpreter: &'a Path,
    pub site_packages: &'a Path,
    pub module: &'a str,
}

impl Launcher<'_> {
    pub fn script(&self) -> String {
        format!(
            r#"#!/bin/bash
export PYTHONPATH="{site_packages}"
exec "{interpreter}" -m {module} "$@"
"#,
            site_packages = self.site_packages.display(),
            interpreter = self.interpreter.display(),
            module = self.module,
        )
    }
}

/// Application-bundle descriptor fields; `plist` is pure templating
#[derive(Debug, Clone, Copy)]
pub struct BundleInfo<'a> {
    pub name: &'a str,
    pub identifier: &'a str,
    pub version: &'a str,
    pub executable: &'a str,
    pub category: &'a str,
    pub minimum_system: &'a str,
}

impl BundleInfo<'_> {
    pub fn plist(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>CFBundleName</key><string>{name}</string>
  <key>CFBundleIdentifier</key><string>{identifier}</string>
  <key>CFBundleVersion</key><string>{version}</string>
  <key>CFBundleShortVersionString</key><string>{version}</string>
  <key>CFBundleExecutable</key><string>{executable}</string>
  <key>CFBundlePackageType</key><string>APPL</string>
  <key>LSMinimumSystemVersion</key><string>{minimum_system}</string>
  <key>LSApplicationCategoryType</key><string>{category}</string>
</dict>
</plist>
"#,
            name = self.name,
            identifier = self.identifier,
            version = self.version,
            executable = self.executable,
            minimum_system = self.minimum_system,
            category = self.category,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn script_pins_interpreter_and_path() {
        let launcher = Launcher {
            interpreter: Path::new("/opt/test/python3"),
            site_packages: Path::new("/opt/test/lib/python3.13/site-packages"),
            module: "ssh_studio.main",
        };

        let script = launcher.script();

        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("export PYTHONPATH=\"/opt/test/lib/python3.13/site-packages\""));
        assert!(script.contains("exec \"/opt/test/python3\" -m ssh_studio.main \"$@\""));
    }

    #[test]
    fn script_is_deterministic() {
        let launcher = Launcher {
            interpreter: Path::new("/opt/test/python3"),
            site_packages: Path::new("/opt/test/lib/python3.13/site-packages"),
            module: "ssh_studio.main",
        };

        assert_eq!(launcher.script(), launcher.script());
    }

    #[test]
    fn plist_carries_formula_fields() {
        let info = BundleInfo {
            name: "SSH Studio",
            identifier: "io.github.BuddySirJava.SSH-Studio",
            version: "1.2.3",
            executable: "ssh-studio",
            category: "public.app-category.developer-tools",
            minimum_system: "11.0",
        };

        let plist = info.plist();

        assert!(plist.contains("<key>CFBundleName</key><string>SSH Studio</string>"));
        assert!(plist.contains("<key>CFBundleVersion</key><string>1.2.3</string>"));
        assert!(plist.contains("<key>CFBundleShortVersionString</key><string>1.2.3</string>"));
        assert!(plist.contains("<key>CFBundleExecutable</key><string>ssh-studio</string>"));
        assert!(plist.contains("<key>CFBundlePackageType</key><string>APPL</string>"));
        assert!(plist.contains("<key>LSMinimumSystemVersion</key><string>11.0</string>"));
    }
}
