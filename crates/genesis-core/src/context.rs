//! Profile context rendering for system prompts

use tracing::debug;

use crate::types::UserProfile;

/// Placeholder for profile fields the user left empty
pub const UNSET: &str = "未設定";

/// Interest label used by the news agent when the user named none
pub const GENERAL_INTEREST: &str = "一般";

/// Render the optional profile as a personalization block.
///
/// No profile yields an empty string. Missing or blank fields render as
/// [`UNSET`].
pub fn format_profile_context(profile: Option<&UserProfile>) -> String {
    let Some(profile) = profile else {
        return String::new();
    };

    let interests = join_interests(profile).unwrap_or_else(|| UNSET.to_string());

    let mut block = String::new();
    block.push_str("\n[ユーザープロファイル情報]\n");
    block.push_str(&format!("- 年齢: {}\n", field_or_unset(&profile.age_group)));
    block.push_str(&format!("- 居住地: {}\n", field_or_unset(&profile.prefecture)));
    block.push_str(&format!("- 職業: {}\n", field_or_unset(&profile.occupation)));
    block.push_str(&format!("- 興味・関心: {}\n", interests));
    block.push('\n');
    block.push_str("回答はこのプロファイル情報を考慮してパーソナライズしてください。\n");
    block.push_str(
        "例えば、年齢層に合わせた言葉遣いや、興味関心に基づいたトピックの選定、職業に関連するアドバイスなどを含めてください。\n",
    );

    debug!("Built profile context ({} chars)", block.len());

    block
}

/// Interests as a prompt fragment, or [`GENERAL_INTEREST`] when none are set
pub fn describe_interests(profile: Option<&UserProfile>) -> String {
    profile
        .and_then(join_interests)
        .unwrap_or_else(|| GENERAL_INTEREST.to_string())
}

fn join_interests(profile: &UserProfile) -> Option<String> {
    let interests: Vec<&str> = profile
        .interests
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .collect();
    if interests.is_empty() {
        None
    } else {
        Some(interests.join(", "))
    }
}

fn field_or_unset(field: &Option<String>) -> &str {
    match field.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => UNSET,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> UserProfile {
        UserProfile {
            id: Some("u-1".to_string()),
            name: Some("山田".to_string()),
            age_group: Some("30代".to_string()),
            occupation: Some("会社員".to_string()),
            prefecture: Some("東京都".to_string()),
            interests: vec!["株式投資".to_string(), "旅行".to_string()],
        }
    }

    #[test]
    fn test_no_profile_is_empty() {
        assert_eq!(format_profile_context(None), "");
    }

    #[test]
    fn test_full_profile() {
        let profile = sample_profile();
        let block = format_profile_context(Some(&profile));
        assert!(block.contains("[ユーザープロファイル情報]"));
        assert!(block.contains("- 年齢: 30代"));
        assert!(block.contains("- 居住地: 東京都"));
        assert!(block.contains("- 職業: 会社員"));
        assert!(block.contains("- 興味・関心: 株式投資, 旅行"));
        assert!(!block.contains(UNSET));
    }

    #[test]
    fn test_empty_interests_render_unset() {
        let profile = UserProfile {
            interests: vec![],
            ..sample_profile()
        };
        let block = format_profile_context(Some(&profile));
        assert!(block.contains(&format!("- 興味・関心: {}", UNSET)));
        assert!(!block.contains("[]"));
    }

    #[test]
    fn test_missing_and_blank_fields_render_unset() {
        let profile = UserProfile {
            age_group: None,
            prefecture: Some("   ".to_string()),
            ..UserProfile::default()
        };
        let block = format_profile_context(Some(&profile));
        assert!(block.contains(&format!("- 年齢: {}", UNSET)));
        assert!(block.contains(&format!("- 居住地: {}", UNSET)));
        assert!(block.contains(&format!("- 職業: {}", UNSET)));
        assert!(!block.contains("None"));
    }

    #[test]
    fn test_describe_interests() {
        assert_eq!(describe_interests(None), GENERAL_INTEREST);
        assert_eq!(describe_interests(Some(&UserProfile::default())), GENERAL_INTEREST);
        assert_eq!(describe_interests(Some(&sample_profile())), "株式投資, 旅行");
    }
}
