// ==========================================
// 合同事项台账 - 国际化
// ==========================================
// 语言: zh-CN（默认/回退）、en
// 覆盖: 导入摘要、行级警告、致命导入错误、名册规则
// 说明: rust_i18n::i18n! 宏在 lib.rs 中初始化
// ==========================================

/// 当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 切换语言（"zh-CN" / "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译无参数消息
///
/// # 示例
/// ```no_run
/// use matter_ledger::i18n::t;
/// let msg = t("owner.name_required");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息并替换 `%{name}` 占位符
///
/// # 示例
/// ```no_run
/// use matter_ledger::i18n::t_with_args;
/// let msg = t_with_args("import.workbook_read", &[("reason", "invalid zip header")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        result = result.replace(&format!("%{{{}}}", k), v);
    }
    result
}
