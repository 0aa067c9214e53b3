//! # 交互确认工具
//!
//! 破坏性覆盖前的同步 y/n 确认。核心导入逻辑只依赖注入的回调
//! (`&mut dyn FnMut(&str, bool) -> bool`)，本模块提供读取 stdin 的默认实现，
//! 使导入/合并逻辑可以在测试中用闭包代替控制台输入。
//!
//! ## 依赖关系
//! - 被 `commands/import.rs` 使用
//! - 无外部模块依赖

use std::io::{self, BufRead, Write};

/// 从 stdin 读取 y/n 确认；空输入取默认值，其他输入反复追问
pub fn confirm_stdin(prompt: &str, default_yes: bool) -> bool {
    let hint = if default_yes { "([y]/n)" } else { "(y/[n])" };
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("{} {}: ", prompt, hint);
        io::stdout().flush().ok();

        line.clear();
        if stdin.lock().read_line(&mut line).is_err() {
            return default_yes;
        }
        match line.trim() {
            "" => return default_yes,
            "y" => return true,
            "n" => return false,
            _ => print!("Please type either 'y' or 'n'. "),
        }
    }
}

/// 总是同意的确认回调（`--yes` 模式）
pub fn always_yes(_prompt: &str, _default_yes: bool) -> bool {
    true
}
