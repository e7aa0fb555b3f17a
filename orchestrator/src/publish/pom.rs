//! Minimal POM generation.

use super::coordinates::Coordinates;

/// Render a POM declaring `coordinates` with `jar` packaging.
///
/// # Examples
///
/// ```
/// use jarsmith::module_name::ModuleName;
/// use jarsmith::publish::coordinates::Coordinates;
/// use jarsmith::publish::pom::render_pom;
/// use jarsmith::version::Version;
///
/// let version = Version::try_from("1.0.0").expect("valid version");
/// let coordinates = Coordinates::new("net.codersky", "yaml", &ModuleName::from("yaml"), version);
/// let pom = render_pom(&coordinates);
/// assert!(pom.contains("<groupId>net.codersky.yaml</groupId>"));
/// assert!(pom.contains("<packaging>jar</packaging>"));
/// ```
#[must_use]
pub fn render_pom(coordinates: &Coordinates) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
         xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 https://maven.apache.org/xsd/maven-4.0.0.xsd">
  <modelVersion>4.0.0</modelVersion>
  <groupId>{}</groupId>
  <artifactId>{}</artifactId>
  <version>{}</version>
  <packaging>jar</packaging>
</project>
"#,
        escape(&coordinates.group_id),
        escape(&coordinates.artifact_id),
        escape(coordinates.version.as_str()),
    )
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
