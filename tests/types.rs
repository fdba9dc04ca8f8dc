// ABOUTME: Integration tests for repository names, tags, regions and image references.
// ABOUTME: Tests parsing, validation, rendering and serde round-trips through YAML.

use ecrbuildpush::types::*;
use proptest::prelude::*;

mod repository_name_tests {
    use super::*;

    #[test]
    fn accepts_namespaced_names() {
        let name = RepositoryName::new("team/service-a").unwrap();
        assert_eq!(name.as_str(), "team/service-a");
    }

    #[test]
    fn empty_returns_error() {
        assert_eq!(RepositoryName::new(""), Err(RepositoryNameError::Empty));
    }

    #[test]
    fn single_char_returns_error() {
        assert_eq!(
            RepositoryName::new("a"),
            Err(RepositoryNameError::InvalidLength)
        );
    }

    #[test]
    fn uppercase_returns_error() {
        assert_eq!(
            RepositoryName::new("MyRepo"),
            Err(RepositoryNameError::NotLowercase)
        );
    }

    #[test]
    fn separator_at_component_edge_returns_error() {
        assert!(RepositoryName::new("team/-svc").is_err());
        assert!(RepositoryName::new("team//svc").is_err());
        assert!(RepositoryName::new("repo-").is_err());
    }

    #[test]
    fn invalid_chars_returns_error() {
        assert_eq!(
            RepositoryName::new("repo:1"),
            Err(RepositoryNameError::InvalidChar(':'))
        );
    }

    #[test]
    fn deserialize_rejects_invalid_names() {
        let result: Result<RepositoryName, _> = serde_yaml::from_str("\"Bad Name\"");
        assert!(result.is_err());
    }
}

mod image_tag_tests {
    use super::*;

    #[test]
    fn accepts_semver_style_tags() {
        assert_eq!(ImageTag::new("v1.2.3-rc_1").unwrap().as_str(), "v1.2.3-rc_1");
    }

    #[test]
    fn leading_dot_or_dash_returns_error() {
        assert_eq!(ImageTag::new(".v1"), Err(ImageTagError::InvalidStart('.')));
        assert_eq!(ImageTag::new("-v1"), Err(ImageTagError::InvalidStart('-')));
    }

    #[test]
    fn too_long_returns_error() {
        assert!(ImageTag::new(&"a".repeat(128)).is_ok());
        assert_eq!(ImageTag::new(&"a".repeat(129)), Err(ImageTagError::TooLong));
    }

    #[test]
    fn slash_returns_error() {
        assert_eq!(ImageTag::new("v1/x"), Err(ImageTagError::InvalidChar('/')));
    }
}

mod region_tests {
    use super::*;

    #[test]
    fn trims_and_accepts_region() {
        assert_eq!(Region::new(" eu-central-1 ").unwrap().to_string(), "eu-central-1");
    }

    #[test]
    fn empty_returns_error() {
        assert_eq!(Region::new("   "), Err(RegionError::Empty));
    }

    #[test]
    fn uppercase_returns_error() {
        assert!(Region::new("EU-CENTRAL-1").is_err());
    }
}

mod image_ref_tests {
    use super::*;

    fn host() -> RegistryHost {
        RegistryHost::new("123456789012", &Region::new("eu-central-1").unwrap()).unwrap()
    }

    #[test]
    fn local_reference_has_no_registry() {
        let image = ImageRef::local(
            &ImageName::new("myapp").unwrap(),
            &ImageTag::new("v1").unwrap(),
        );
        assert!(image.registry().is_none());
        assert_eq!(image.to_string(), "myapp:v1");
        assert_eq!(image.repository(), "myapp");
    }

    #[test]
    fn remote_reference_uses_ecr_host() {
        let image = ImageRef::remote(
            &host(),
            &RepositoryName::new("repo-1").unwrap(),
            &ImageTag::new("v1").unwrap(),
        );
        assert_eq!(
            image.to_string(),
            "123456789012.dkr.ecr.eu-central-1.amazonaws.com/repo-1:v1"
        );
        assert_eq!(
            image.repository(),
            "123456789012.dkr.ecr.eu-central-1.amazonaws.com/repo-1"
        );
        assert_eq!(image.name(), "repo-1");
        assert_eq!(image.tag(), "v1");
    }

    #[test]
    fn registry_host_rejects_bad_account() {
        let region = Region::new("us-east-1").unwrap();
        assert_eq!(
            RegistryHost::new("", &region),
            Err(ParseImageRefError::EmptyAccountId)
        );
        assert_eq!(
            RegistryHost::new("12/34", &region),
            Err(ParseImageRefError::InvalidChar('/'))
        );
    }
}

proptest! {
    #[test]
    fn valid_tags_survive_yaml(tag in "[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}") {
        let parsed = ImageTag::new(&tag).unwrap();
        let yaml = serde_yaml::to_string(&parsed).unwrap();
        let back: ImageTag = serde_yaml::from_str(&yaml).unwrap();
        prop_assert_eq!(back, parsed);
    }

    #[test]
    fn tags_never_contain_path_separators(tag in ".{1,40}") {
        if let Ok(parsed) = ImageTag::new(&tag) {
            prop_assert!(!parsed.as_str().contains('/'));
            prop_assert!(!parsed.as_str().contains(':'));
        }
    }

    #[test]
    fn remote_reference_ends_with_repository_and_tag(
        repo in "[a-z0-9]{2,20}(/[a-z0-9]{1,10})?",
        tag in "[a-z0-9]{1,20}",
    ) {
        let host = RegistryHost::new("acct", &Region::new("us-west-2").unwrap()).unwrap();
        let image = ImageRef::remote(
            &host,
            &RepositoryName::new(&repo).unwrap(),
            &ImageTag::new(&tag).unwrap(),
        );
        let expected_suffix = format!("/{}:{}", repo, tag);
        prop_assert!(image.to_string().ends_with(&expected_suffix));
        prop_assert!(image.to_string().starts_with("acct.dkr.ecr.us-west-2.amazonaws.com/"));
    }
}
