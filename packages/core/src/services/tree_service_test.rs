//! Integration Tests for TreeService
//!
//! Exercises bootstrap, materialization and the three mutations against a
//! real libsql database file, checking the structural invariants after
//! every step.

#[cfg(test)]
mod tree_service_tests {
    use crate::models::AnimalNode;
    use crate::services::{TreeService, TreeServiceError};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Helper to create a service over a fresh database file
    async fn create_test_service() -> (Arc<TreeService>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("animals.db");

        let service = Arc::new(TreeService::open(db_path).await.unwrap());

        (service, temp_dir)
    }

    async fn assert_consistent(service: &TreeService) {
        let report = service.integrity_report().await.unwrap();
        assert!(report.is_consistent(), "invariants violated: {:?}", report);
    }

    #[tokio::test]
    async fn test_fresh_store_has_single_root() {
        let (service, _temp) = create_test_service().await;

        assert_eq!(service.root_id(), 1);
        let tree = service.get_tree().await.unwrap();
        assert_eq!(tree, AnimalNode::leaf(1, "root"));
        assert_consistent(&service).await;
    }

    #[tokio::test]
    async fn test_root_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("animals.db");

        let first = TreeService::open(db_path.clone()).await.unwrap();
        first.insert_child(first.root_id(), "dog").await.unwrap();
        drop(first);

        let second = TreeService::open(db_path).await.unwrap();
        assert_eq!(second.root_id(), 1);
        assert_eq!(second.count_animals().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_then_read() {
        let (service, _temp) = create_test_service().await;

        let dog = service.insert_child(1, "dog").await.unwrap();

        let tree = service.get_tree().await.unwrap();
        assert_eq!(tree.children, vec![AnimalNode::leaf(dog, "dog")]);

        let rendered: serde_json::Value =
            serde_json::from_slice(&service.render_tree().await.unwrap()).unwrap();
        assert_eq!(
            rendered,
            serde_json::json!([{ "1": { "label": "root", "children": [
                { (dog.to_string()): { "label": "dog", "children": [] } }
            ] } }])
        );
    }

    #[tokio::test]
    async fn test_insert_missing_parent_creates_nothing() {
        let (service, _temp) = create_test_service().await;

        let before = service.count_animals().await.unwrap();
        let err = service.insert_child(9999, "ghost").await.unwrap_err();

        assert!(matches!(err, TreeServiceError::ParentNotFound { parent_id: 9999 }));
        assert_eq!(err.to_string(), "Parent 9999 does not exist.");
        assert_eq!(service.count_animals().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_label_passed_through_opaquely() {
        let (service, _temp) = create_test_service().await;

        let label = "  🦊 fox / \"quoted\" ";
        let id = service.insert_child(1, label).await.unwrap();
        assert_eq!(service.get_animal(id).await.unwrap().label, label);

        let empty = service.insert_child(1, "").await.unwrap();
        assert_eq!(service.get_animal(empty).await.unwrap().label, "");
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let (service, _temp) = create_test_service().await;

        let dog = service.insert_child(1, "dog").await.unwrap();
        let puppy = service.insert_child(dog, "puppy").await.unwrap();

        let err = service.delete_animal(1).await.unwrap_err();
        assert!(matches!(err, TreeServiceError::CannotDeleteRoot));

        let err = service.delete_animal(dog).await.unwrap_err();
        assert_eq!(err.to_string(), format!("Animal {} is a parent.", dog));

        service.delete_animal(puppy).await.unwrap();
        let err = service.delete_animal(puppy).await.unwrap_err();
        assert_eq!(err.to_string(), format!("Animal {} does not exist.", puppy));

        service.delete_animal(dog).await.unwrap();

        let tree = service.get_tree().await.unwrap();
        assert!(tree.is_leaf());
        assert_consistent(&service).await;
    }

    #[tokio::test]
    async fn test_reparent_moves_subtree() {
        let (service, _temp) = create_test_service().await;

        let dog = service.insert_child(1, "dog").await.unwrap();
        let cat = service.insert_child(1, "cat").await.unwrap();
        let puppy = service.insert_child(dog, "puppy").await.unwrap();

        service.reparent_animal(dog, cat).await.unwrap();

        let tree = service.get_tree().await.unwrap();
        assert_eq!(tree.children.len(), 1);
        let cat_node = &tree.children[0];
        assert_eq!(cat_node.id, cat);
        assert_eq!(cat_node.children[0].id, dog);
        assert_eq!(cat_node.children[0].children[0].id, puppy);
        assert_consistent(&service).await;
    }

    #[tokio::test]
    async fn test_reparent_missing_target_or_parent() {
        let (service, _temp) = create_test_service().await;

        let dog = service.insert_child(1, "dog").await.unwrap();

        let err = service.reparent_animal(dog, 9999).await.unwrap_err();
        assert_eq!(err.to_string(), "Parent 9999 does not exist.");
        assert_eq!(service.get_animal(dog).await.unwrap().parent_id, Some(1));

        let err = service.reparent_animal(4242, 1).await.unwrap_err();
        assert_eq!(err.to_string(), "Animal 4242 does not exist.");
    }

    #[tokio::test]
    async fn test_reparent_refuses_cycles() {
        let (service, _temp) = create_test_service().await;

        let a = service.insert_child(1, "a").await.unwrap();
        let b = service.insert_child(a, "b").await.unwrap();
        let c = service.insert_child(b, "c").await.unwrap();

        let err = service.reparent_animal(a, c).await.unwrap_err();
        assert!(matches!(err, TreeServiceError::WouldCreateCycle { .. }));

        let err = service.reparent_animal(b, b).await.unwrap_err();
        assert!(matches!(err, TreeServiceError::WouldCreateCycle { .. }));

        let err = service.reparent_animal(1, a).await.unwrap_err();
        assert!(matches!(err, TreeServiceError::WouldCreateCycle { .. }));

        assert_eq!(service.get_animal(a).await.unwrap().parent_id, Some(1));
        assert_eq!(service.get_tree().await.unwrap().size(), 4);
        assert_consistent(&service).await;
    }

    #[tokio::test]
    async fn test_repeated_reads_are_identical() {
        let (service, _temp) = create_test_service().await;

        let dog = service.insert_child(1, "dog").await.unwrap();
        service.insert_child(dog, "puppy").await.unwrap();
        service.insert_child(1, "cat").await.unwrap();

        let first = service.render_tree().await.unwrap();
        let second = service.render_tree().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_invariants_hold_across_mixed_operations() {
        let (service, _temp) = create_test_service().await;

        let mut ids = vec![1];
        for i in 0..30 {
            let parent = ids[(i * 7) % ids.len()];
            ids.push(service.insert_child(parent, &format!("animal-{}", i)).await.unwrap());
            assert_consistent(&service).await;
        }

        for i in 0..30 {
            let id = ids[1 + (i * 11) % 30];
            let new_parent = ids[(i * 13) % ids.len()];
            // Cycles and self-moves are rejected; everything else succeeds
            let _ = service.reparent_animal(id, new_parent).await;
            assert_consistent(&service).await;
        }

        for &id in ids.iter().skip(1).rev() {
            let _ = service.delete_animal(id).await;
            assert_consistent(&service).await;
        }

        let tree = service.get_tree().await.unwrap();
        assert_eq!(tree.size() as u64, service.count_animals().await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts() {
        let (service, _temp) = create_test_service().await;

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move { service.insert_child(1, &format!("animal-{}", i)).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(service.count_animals().await.unwrap(), 17);
        assert_eq!(service.get_tree().await.unwrap().children.len(), 16);
        assert_consistent(&service).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_delete_and_insert_under_same_node() {
        let (service, _temp) = create_test_service().await;

        for round in 0..10 {
            let target = service.insert_child(1, &format!("target-{}", round)).await.unwrap();

            let deleter = {
                let service = service.clone();
                tokio::spawn(async move { service.delete_animal(target).await })
            };
            let inserter = {
                let service = service.clone();
                tokio::spawn(async move { service.insert_child(target, "child").await })
            };

            let deleted = deleter.await.unwrap();
            let inserted = inserter.await.unwrap();

            // Exactly one side wins; never both
            match (&deleted, &inserted) {
                (Ok(()), Err(TreeServiceError::ParentNotFound { .. })) => {}
                (Err(TreeServiceError::AnimalIsParent { .. }), Ok(_)) => {}
                other => panic!("unexpected outcome pair: {:?}", other),
            }
            assert_consistent(&service).await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_opposing_reparents() {
        let (service, _temp) = create_test_service().await;

        for round in 0..10 {
            let a = service.insert_child(1, &format!("a-{}", round)).await.unwrap();
            let b = service.insert_child(1, &format!("b-{}", round)).await.unwrap();

            let a_under_b = {
                let service = service.clone();
                tokio::spawn(async move { service.reparent_animal(a, b).await })
            };
            let b_under_a = {
                let service = service.clone();
                tokio::spawn(async move { service.reparent_animal(b, a).await })
            };

            let first = a_under_b.await.unwrap();
            let second = b_under_a.await.unwrap();

            // Whichever commits second finds the other already beneath it
            match (&first, &second) {
                (Ok(()), Err(TreeServiceError::WouldCreateCycle { .. })) => {
                    assert_eq!(service.get_animal(a).await.unwrap().parent_id, Some(b));
                    assert_eq!(service.get_animal(b).await.unwrap().parent_id, Some(1));
                }
                (Err(TreeServiceError::WouldCreateCycle { .. }), Ok(())) => {
                    assert_eq!(service.get_animal(b).await.unwrap().parent_id, Some(a));
                    assert_eq!(service.get_animal(a).await.unwrap().parent_id, Some(1));
                }
                other => panic!("unexpected outcome pair: {:?}", other),
            }
            assert_consistent(&service).await;
        }

        assert_eq!(service.get_tree().await.unwrap().size(), 21);
    }
}
