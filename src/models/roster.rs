use serde::{Deserialize, Serialize};

/// 名单中的一名学生
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// 平台上的显示名，同时用作匹配键
    pub nombre_crea: String,
    /// 其余字段原样保留
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// 课程配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub curso: String,
    #[serde(default)]
    pub centro: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub estudiantes: Vec<Student>,
}

impl Course {
    /// 用于选择列表的标签
    pub fn label(&self) -> String {
        format!(
            "{} - {} ({}) - {} estudiantes",
            self.id,
            self.curso,
            self.centro,
            self.estudiantes.len()
        )
    }

    pub fn has_students(&self) -> bool {
        !self.estudiantes.is_empty()
    }

    /// 输出目录名，slug 为空时使用 `default`
    pub fn output_slug(&self) -> &str {
        if self.slug.is_empty() {
            "default"
        } else {
            &self.slug
        }
    }

    /// 按原始顺序生成名单条目
    pub fn roster(&self) -> Vec<RosterEntry> {
        self.estudiantes
            .iter()
            .map(|s| RosterEntry::new(&s.nombre_crea))
            .collect()
    }
}

/// 名单条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    /// 显示名
    pub display_name: String,
    /// 匹配键（与抓取到的作者名不区分大小写比较）
    pub match_key: String,
}

impl RosterEntry {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            match_key: name.clone(),
            display_name: name,
        }
    }
}

/// 只保留有学生的课程
pub fn courses_with_students(courses: &[Course]) -> Vec<&Course> {
    courses.iter().filter(|c| c.has_students()).collect()
}

/// 按编号查找课程
pub fn find_course<'a>(courses: &'a [Course], id: &str) -> Option<&'a Course> {
    courses
        .iter()
        .find(|c| c.has_students() && c.id == id.trim())
}

// 课程编号可能是字符串或整数
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer course id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COURSES: &str = r#"[
        {"id": 1, "curso": "Programación 1", "centro": "Centro A", "slug": "programacion1-a",
         "estudiantes": [{"nombre_crea": "John Doe", "documento": "123"}, {"nombre_crea": "Jane Doe"}]},
        {"id": "2", "curso": "Vacío", "centro": "Centro B", "slug": "vacio", "estudiantes": []}
    ]"#;

    #[test]
    fn test_parse_courses() {
        let courses: Vec<Course> = serde_json::from_str(COURSES).unwrap();
        assert_eq!(courses[0].id, "1");
        assert_eq!(courses[1].id, "2");
        assert_eq!(
            courses[0].estudiantes[0].extra.get("documento"),
            Some(&serde_json::json!("123"))
        );
        assert_eq!(
            courses[0].label(),
            "1 - Programación 1 (Centro A) - 2 estudiantes"
        );
    }

    #[test]
    fn test_roster_keeps_order() {
        let courses: Vec<Course> = serde_json::from_str(COURSES).unwrap();
        let roster = courses[0].roster();
        assert_eq!(
            roster,
            vec![RosterEntry::new("John Doe"), RosterEntry::new("Jane Doe")]
        );
    }

    #[test]
    fn test_only_courses_with_students_are_selectable() {
        let courses: Vec<Course> = serde_json::from_str(COURSES).unwrap();
        assert_eq!(courses_with_students(&courses).len(), 1);
        assert!(find_course(&courses, "1").is_some());
        assert!(find_course(&courses, "2").is_none());
    }
}
