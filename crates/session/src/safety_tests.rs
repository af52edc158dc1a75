use super::*;

fn policy() -> SafetyPolicy {
    let mut block = HashSet::new();
    block.insert(Severity::High);
    SafetyPolicy {
        rules: vec![
            SafetyRule::new("secret_key", Severity::High, r"sk-[a-zA-Z0-9]{8,}").expect("regex"),
            SafetyRule::new("todo", Severity::Low, r"TODO").expect("regex"),
        ],
        approved_codes: HashSet::new(),
        block_severities: block,
    }
}

#[test]
fn finds_matches_with_line_and_column() {
    let findings = scan(&policy(), "line one\nTODO fix this\n");
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].code, "todo");
    assert_eq!(findings[0].line, 2);
    assert_eq!(findings[0].column, 1);
}

#[test]
fn longest_match_wins_at_same_position() {
    let mut rules_policy = policy();
    rules_policy
        .rules
        .push(SafetyRule::new("todo_fix", Severity::Medium, r"TODO fix").expect("regex"));
    let findings = scan(&rules_policy, "TODO fix this\n");
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].code, "todo_fix");
}

#[test]
fn matches_do_not_overlap() {
    let p = SafetyPolicy {
        rules: vec![SafetyRule::new("aa", Severity::Low, "aa").expect("regex")],
        approved_codes: HashSet::new(),
        block_severities: HashSet::new(),
    };
    let findings = scan(&p, "aaaa");
    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0].index, 0);
    assert_eq!(findings[1].index, 2);
}

#[test]
fn blocks_when_severity_in_block_set_and_not_approved() {
    let findings = scan(&policy(), "sk-abcdefghij");
    assert!(policy().blocks(&findings));
}

#[test]
fn approved_codes_do_not_block() {
    let mut p = policy();
    p.approved_codes.insert("secret_key".to_string());
    let findings = scan(&p, "sk-abcdefghij");
    assert!(!p.blocks(&findings));
}

#[test]
fn empty_policy_has_no_findings() {
    let p = SafetyPolicy::default();
    assert!(p.is_empty());
    assert!(scan(&p, "sk-abcdefghij TODO").is_empty());
}
