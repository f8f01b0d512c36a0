use family_tree::authz::Actor;
use family_tree::db::Database;
use family_tree::error::{domain_error, DomainError};
use family_tree::models::*;
use family_tree::tree::TreeSource;
use speculate2::speculate;

fn register(db: &Database, email: &str) -> User {
    db.register_user(RegisterInput {
        email: email.to_string(),
        name: "Test User".to_string(),
        password: "password123".to_string(),
    })
    .expect("Failed to register user")
}

fn create_admin(db: &Database) -> User {
    db.create_admin(RegisterInput {
        email: "admin@example.com".to_string(),
        name: "Admin".to_string(),
        password: "admin-password".to_string(),
    })
    .expect("Failed to create admin")
}

fn create_person(db: &Database, actor: &Actor, first: &str, last: &str) -> Individual {
    db.create_individual(actor, CreateIndividualInput::named(first, last))
        .expect("Failed to create individual")
}

fn expect_domain_error<T: std::fmt::Debug>(result: anyhow::Result<T>) -> DomainError {
    let err = result.expect_err("Expected an error");
    domain_error(&err)
        .cloned()
        .unwrap_or_else(|| panic!("Expected a domain error, got: {:#}", err))
}

fn link(db: &Database, actor: &Actor, from: i64, to: i64, kind: RelationshipType) -> anyhow::Result<Relationship> {
    db.create_relationship(
        actor,
        CreateRelationshipInput {
            individual_id: from,
            related_individual_id: to,
            relationship_type: kind,
        },
    )
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "users" {
        it "registers an unapproved member" {
            let user = register(&db, "Jane@Example.com");

            assert_eq!(user.email, "jane@example.com");
            assert_eq!(user.role, Role::Member);
            assert!(!user.is_approved);
        }

        it "rejects a duplicate email" {
            register(&db, "jane@example.com");

            let err = expect_domain_error(db.register_user(RegisterInput {
                email: "JANE@example.com".to_string(),
                name: "Other".to_string(),
                password: "password123".to_string(),
            }));
            assert!(matches!(err, DomainError::Conflict(_)));
        }

        it "rejects a short password" {
            let err = expect_domain_error(db.register_user(RegisterInput {
                email: "short@example.com".to_string(),
                name: "Short".to_string(),
                password: "abc".to_string(),
            }));
            assert!(matches!(err, DomainError::Invalid(_)));
        }

        describe "login" {
            it "refuses unapproved accounts" {
                register(&db, "jane@example.com");

                let err = expect_domain_error(db.login(
                    LoginInput {
                        email: "jane@example.com".to_string(),
                        password: "password123".to_string(),
                    },
                    chrono::Duration::hours(1),
                ));
                assert!(matches!(err, DomainError::Forbidden(_)));
            }

            it "refuses a wrong password" {
                create_admin(&db);

                let err = expect_domain_error(db.login(
                    LoginInput {
                        email: "admin@example.com".to_string(),
                        password: "not-the-password".to_string(),
                    },
                    chrono::Duration::hours(1),
                ));
                assert_eq!(err, DomainError::Unauthorized("Invalid credentials".to_string()));
            }

            it "issues a token that resolves to the user" {
                let admin = create_admin(&db);

                let login = db.login(
                    LoginInput {
                        email: "admin@example.com".to_string(),
                        password: "admin-password".to_string(),
                    },
                    chrono::Duration::hours(1),
                ).expect("Login failed");

                let resolved = db.user_for_token(&login.token).expect("Query failed");
                assert_eq!(resolved.map(|u| u.id), Some(admin.id));
            }

            it "forgets revoked and expired tokens" {
                create_admin(&db);
                let input = LoginInput {
                    email: "admin@example.com".to_string(),
                    password: "admin-password".to_string(),
                };

                let revoked = db.login(input.clone(), chrono::Duration::hours(1)).unwrap();
                assert!(db.revoke_token(&revoked.token).unwrap());
                assert!(db.user_for_token(&revoked.token).unwrap().is_none());

                let expired = db.login(input, chrono::Duration::hours(-1)).unwrap();
                assert!(db.user_for_token(&expired.token).unwrap().is_none());
            }

            it "purges unused expired tokens on the next login" {
                create_admin(&db);
                let input = LoginInput {
                    email: "admin@example.com".to_string(),
                    password: "admin-password".to_string(),
                };

                db.login(input.clone(), chrono::Duration::hours(-1)).unwrap();
                let fresh = db.login(input.clone(), chrono::Duration::hours(1)).unwrap();
                assert_eq!(db.purge_expired_tokens().unwrap(), 0);
                assert!(db.user_for_token(&fresh.token).unwrap().is_some());

                db.login(input, chrono::Duration::hours(-1)).unwrap();
                assert_eq!(db.purge_expired_tokens().unwrap(), 1);
            }
        }
    }

    describe "invitations" {
        it "requires an administrator" {
            let member = register(&db, "member@example.com");

            let err = expect_domain_error(db.create_invitation(
                &Actor::from(&member),
                CreateInvitationInput { email: "new@example.com".to_string() },
            ));
            assert!(matches!(err, DomainError::Forbidden(_)));
        }

        it "rejects inviting the same email twice" {
            let admin = Actor::from(&create_admin(&db));
            let input = CreateInvitationInput { email: "new@example.com".to_string() };

            db.create_invitation(&admin, input.clone()).expect("First invite failed");
            let err = expect_domain_error(db.create_invitation(&admin, input));
            assert!(matches!(err, DomainError::Conflict(_)));
        }

        it "rejects inviting an existing user" {
            let admin = Actor::from(&create_admin(&db));
            register(&db, "jane@example.com");

            let err = expect_domain_error(db.create_invitation(
                &admin,
                CreateInvitationInput { email: "jane@example.com".to_string() },
            ));
            assert!(matches!(err, DomainError::Conflict(_)));
        }

        it "lists pending invitations with the inviter name" {
            let admin = Actor::from(&create_admin(&db));
            db.create_invitation(&admin, CreateInvitationInput { email: "a@example.com".to_string() }).unwrap();
            db.create_invitation(&admin, CreateInvitationInput { email: "b@example.com".to_string() }).unwrap();
            db.reject_invitation("a@example.com").unwrap();

            let pending = db.get_pending_invitations().expect("Query failed");
            assert_eq!(pending.len(), 1);
            assert_eq!(pending[0].invitation.email, "b@example.com");
            assert_eq!(pending[0].invited_by_name, "Admin");
        }

        it "approves the invited user" {
            let admin = Actor::from(&create_admin(&db));
            db.create_invitation(&admin, CreateInvitationInput { email: "jane@example.com".to_string() }).unwrap();
            register(&db, "jane@example.com");

            let result = db.approve_invitation("jane@example.com").expect("Approval failed");

            assert!(result.user.is_approved);
            assert_eq!(result.invitation.status, InvitationStatus::Accepted);
            let err = expect_domain_error(db.approve_invitation("jane@example.com"));
            assert!(matches!(err, DomainError::NotFound(_)));
        }

        it "keeps the invitation pending when the user has not registered" {
            let admin = Actor::from(&create_admin(&db));
            db.create_invitation(&admin, CreateInvitationInput { email: "ghost@example.com".to_string() }).unwrap();

            let err = expect_domain_error(db.approve_invitation("ghost@example.com"));
            assert_eq!(err, DomainError::not_found("User"));

            let pending = db.get_pending_invitations().unwrap();
            assert_eq!(pending.len(), 1);
        }
    }

    describe "individuals" {
        it "creates an individual owned by the actor and alive by default" {
            let owner = Actor::from(&register(&db, "jane@example.com"));

            let person = create_person(&db, &owner, "Jane", "Doe");

            assert_eq!(person.owning_user_id, Some(owner.user_id));
            assert!(person.is_alive);
            assert_eq!(db.get_individual(person.id).unwrap(), Some(person));
        }

        it "rejects blank names" {
            let owner = Actor::from(&register(&db, "jane@example.com"));
            let err = expect_domain_error(db.create_individual(&owner, CreateIndividualInput::named(" ", "Doe")));
            assert!(matches!(err, DomainError::Invalid(_)));
        }

        it "lets only the owner or an admin edit" {
            let owner = Actor::from(&register(&db, "owner@example.com"));
            let stranger = Actor::from(&register(&db, "stranger@example.com"));
            let admin = Actor::from(&create_admin(&db));
            let person = create_person(&db, &owner, "Jane", "Doe");

            let edit = UpdateIndividualInput {
                first_name: "Janet".to_string(),
                last_name: "Doe".to_string(),
                is_alive: false,
                death_place: Some("Oslo".to_string()),
                ..Default::default()
            };

            let err = expect_domain_error(db.update_individual(&stranger, person.id, edit.clone()));
            assert!(matches!(err, DomainError::Forbidden(_)));

            let updated = db.update_individual(&admin, person.id, edit).expect("Admin edit failed");
            assert_eq!(updated.first_name, "Janet");
            assert!(!updated.is_alive);
            assert_eq!(updated.owning_user_id, Some(owner.user_id));

            let err = expect_domain_error(db.update_individual(&admin, 9999, UpdateIndividualInput {
                first_name: "X".to_string(),
                last_name: "Y".to_string(),
                ..Default::default()
            }));
            assert!(matches!(err, DomainError::NotFound(_)));
        }

        it "adds a child with its edge" {
            let owner = Actor::from(&register(&db, "owner@example.com"));
            let parent = create_person(&db, &owner, "Jane", "Doe");

            let created = db.add_child(&owner, parent.id, CreateIndividualInput::named("Tim", "Doe"))
                .expect("Add child failed");

            assert_eq!(created.relationship.individual_id, parent.id);
            assert_eq!(created.relationship.related_individual_id, created.individual.id);
            assert_eq!(created.relationship.relationship_type, RelationshipType::Child);
        }

        it "does not leave a half-created child behind" {
            let owner = Actor::from(&register(&db, "owner@example.com"));
            let stranger = Actor::from(&register(&db, "stranger@example.com"));
            let parent = create_person(&db, &owner, "Jane", "Doe");

            let err = expect_domain_error(db.add_child(&stranger, parent.id, CreateIndividualInput::named("Tim", "Doe")));
            assert!(matches!(err, DomainError::Forbidden(_)));
            assert_eq!(db.get_all_individuals().unwrap().len(), 1);
        }

        it "orders individuals by last name then first name" {
            let owner = Actor::from(&register(&db, "owner@example.com"));
            create_person(&db, &owner, "Zoe", "Adams");
            create_person(&db, &owner, "Bob", "Zimmer");
            create_person(&db, &owner, "Amy", "Adams");

            let names: Vec<_> = db.get_all_individuals().unwrap().iter().map(Individual::full_name).collect();
            assert_eq!(names, vec!["Amy Adams", "Zoe Adams", "Bob Zimmer"]);
        }
    }

    describe "relationships" {
        it "rejects a second edge between the same pair in either direction" {
            let owner = Actor::from(&register(&db, "owner@example.com"));
            let a = create_person(&db, &owner, "A", "Doe");
            let b = create_person(&db, &owner, "B", "Doe");

            link(&db, &owner, a.id, b.id, RelationshipType::Spouse).expect("First link failed");

            let same = expect_domain_error(link(&db, &owner, a.id, b.id, RelationshipType::Child));
            let reversed = expect_domain_error(link(&db, &owner, b.id, a.id, RelationshipType::Sibling));
            assert!(matches!(same, DomainError::Conflict(_)));
            assert!(matches!(reversed, DomainError::Conflict(_)));
        }

        it "reports missing endpoints as not found" {
            let owner = Actor::from(&register(&db, "owner@example.com"));
            let a = create_person(&db, &owner, "A", "Doe");

            let err = expect_domain_error(link(&db, &owner, a.id, 404, RelationshipType::Child));
            assert!(matches!(err, DomainError::NotFound(_)));
        }

        it "forbids linking profiles owned by someone else" {
            let owner = Actor::from(&register(&db, "owner@example.com"));
            let stranger = Actor::from(&register(&db, "stranger@example.com"));
            let a = create_person(&db, &owner, "A", "Doe");
            let b = create_person(&db, &owner, "B", "Doe");

            let err = expect_domain_error(link(&db, &stranger, a.id, b.id, RelationshipType::Child));
            assert!(matches!(err, DomainError::Forbidden(_)));
        }

        it "does not create an inverse edge" {
            let owner = Actor::from(&register(&db, "owner@example.com"));
            let a = create_person(&db, &owner, "A", "Doe");
            let b = create_person(&db, &owner, "B", "Doe");

            link(&db, &owner, a.id, b.id, RelationshipType::Child).unwrap();

            let edges = db.get_all_edges().unwrap();
            assert_eq!(edges.len(), 1);
            assert_eq!((edges[0].source, edges[0].target), (a.id, b.id));
        }

        it "lists relationships from either side with names" {
            let owner = Actor::from(&register(&db, "owner@example.com"));
            let a = create_person(&db, &owner, "Ann", "Doe");
            let b = create_person(&db, &owner, "Ben", "Doe");
            let c = create_person(&db, &owner, "Cat", "Doe");
            link(&db, &owner, a.id, b.id, RelationshipType::Child).unwrap();
            link(&db, &owner, c.id, b.id, RelationshipType::Sibling).unwrap();

            let for_b = db.get_relationships_for(b.id).unwrap();
            assert_eq!(for_b.len(), 2);
            assert_eq!(for_b[0].individual_first_name, "Ann");
            assert_eq!(for_b[1].related_first_name, "Ben");
        }

        it "deletes only with permission" {
            let owner = Actor::from(&register(&db, "owner@example.com"));
            let stranger = Actor::from(&register(&db, "stranger@example.com"));
            let a = create_person(&db, &owner, "A", "Doe");
            let b = create_person(&db, &owner, "B", "Doe");
            let rel = link(&db, &owner, a.id, b.id, RelationshipType::Child).unwrap();

            let err = expect_domain_error(db.delete_relationship(&stranger, rel.id));
            assert!(matches!(err, DomainError::Forbidden(_)));

            db.delete_relationship(&owner, rel.id).expect("Delete failed");
            assert!(db.get_relationship(rel.id).unwrap().is_none());

            let err = expect_domain_error(db.delete_relationship(&owner, rel.id));
            assert!(matches!(err, DomainError::NotFound(_)));
        }
    }

    describe "tree" {
        it "has no tree for an empty database" {
            assert!(db.get_tree().unwrap().is_none());
        }

        it "builds from stored child edges" {
            let owner = Actor::from(&register(&db, "owner@example.com"));
            let grandma = create_person(&db, &owner, "Edith", "Adams");
            let mum = db.add_child(&owner, grandma.id, CreateIndividualInput::named("Mary", "Brown")).unwrap().individual;
            let kid = db.add_child(&owner, mum.id, CreateIndividualInput::named("Sam", "Brown")).unwrap().individual;

            let built = db.get_tree().unwrap().expect("tree");
            assert_eq!(built.root.id(), grandma.id);
            assert_eq!(built.root.child_ids(), vec![mum.id]);
            assert_eq!(built.root.find(kid.id).map(|n| n.depth), Some(2));
        }

        it "snapshots individuals and edges together" {
            let owner = Actor::from(&register(&db, "owner@example.com"));
            let a = create_person(&db, &owner, "A", "Doe");
            let b = create_person(&db, &owner, "B", "Doe");
            link(&db, &owner, a.id, b.id, RelationshipType::Child).unwrap();

            let snapshot = db.fetch_snapshot().unwrap();
            assert_eq!(snapshot.individuals.len(), 2);
            assert_eq!(snapshot.edges.len(), 1);
        }
    }

    describe "on disk" {
        it "persists across reopen" {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("nested").join("tree.db");

            let first = Database::open(path.clone()).unwrap();
            first.migrate().unwrap();
            let owner = Actor::from(&first.create_admin(RegisterInput {
                email: "admin@example.com".to_string(),
                name: "Admin".to_string(),
                password: "admin-password".to_string(),
            }).unwrap());
            create_person(&first, &owner, "Jane", "Doe");
            drop(first);

            let second = Database::open(path).unwrap();
            second.migrate().unwrap();
            assert_eq!(second.get_all_individuals().unwrap().len(), 1);
        }
    }
}
