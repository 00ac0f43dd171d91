use crate::cli::{parse_work_dir_expression, WorkDirExpression};

pub fn glob_filter(pattern: &str) -> WorkDirExpression {
    parse_work_dir_expression(&format!("glob(\"{}\")", pattern)).unwrap()
}

pub fn glob_filter_excluding(pattern: &str, exclude: &str) -> WorkDirExpression {
    parse_work_dir_expression(&format!("glob(\"{}\", \"{}\")", pattern, exclude)).unwrap()
}

pub fn path_filter(path: &str) -> WorkDirExpression {
    parse_work_dir_expression(path).unwrap()
}
