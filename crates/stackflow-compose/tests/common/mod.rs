use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const REGISTRY: &str = r#"{
    "version": "1.0",
    "services": {
        "database": {
            "mysql": {
                "displayName": "MySQL",
                "templateRef": "database/mysql.yml",
                "defaultVariables": {"MYSQL_VERSION": "8.0"},
                "requiredVariables": ["DB_PASSWORD"],
                "providedResources": ["mysql_data"]
            }
        },
        "cache": {
            "redis": {
                "displayName": "Redis",
                "templateRef": "cache/redis.yml",
                "defaultVariables": {"REDIS_PORT": 6379},
                "providedResources": ["redis_data"]
            }
        },
        "workers": {
            "horizon": {
                "displayName": "Laravel Horizon",
                "templateRef": "workers/laravel.yml#horizon",
                "dependsOn": ["redis"],
                "providedResources": ["storage"]
            },
            "scheduler": {
                "displayName": "Laravel Scheduler",
                "templateRef": "workers/laravel.yml#scheduler",
                "providedResources": ["storage"]
            }
        },
        "app": {
            "web": {
                "displayName": "Web",
                "templateRef": "app/web.yml",
                "defaultVariables": {"V": "A"}
            }
        },
        "broken": {
            "yaml": {
                "displayName": "Broken",
                "templateRef": "broken/yaml.yml"
            }
        }
    }
}"#;

pub const MANIFEST: &str = r#"{
    "name": "laravel",
    "version": "1.0.0",
    "type": "php",
    "framework": "laravel",
    "required_services": {
        "database": {"category": "database", "options": ["mysql"], "default": "mysql"}
    },
    "optional_services": {
        "cache": {"category": "cache", "options": ["redis"], "default": "redis"}
    },
    "service_overrides": {
        "app.web": {
            "variables": {"V": "B"},
            "environments": {
                "production": {"variables": {"V": "C"}},
                "staging": {"deploy": {"replicas": 2}}
            }
        },
        "cache.redis": {
            "environments": {
                "production": {"resources": {"limits": {"memory": "1G"}}}
            }
        }
    },
    "generated_variables": {
        "DB_PASSWORD": {"generator": "secure_random", "length": 32}
    }
}"#;

const REDIS_TEMPLATE: &str = r#"redis:
  image: redis:7-alpine
  container_name: {{PROJECT_NAME}}_redis
  command: redis-server --maxmemory {{REDIS_MAX_MEMORY}} --port {{REDIS_PORT}}
  volumes:
    - redis_data:/data
  networks:
    - {{NETWORK_NAME}}
  deploy:
    resources:
      limits:
        cpus: '0.5'
"#;

const MYSQL_TEMPLATE: &str = r#"mysql:
  image: mysql:{{MYSQL_VERSION}}
  environment:
    MYSQL_ROOT_PASSWORD: "{{DB_PASSWORD}}"
  volumes:
    - mysql_data:/var/lib/mysql
"#;

const WORKERS_TEMPLATE: &str = r#"# @section: horizon
horizon:
  image: {{PROJECT_NAME}}-app
  command: php artisan horizon
  depends_on:
    - redis
  volumes:
    - storage:/var/www/storage

# @section: scheduler
scheduler:
  image: {{PROJECT_NAME}}-app
  command: php artisan schedule:work
  volumes:
    - storage:/var/www/storage
"#;

const WEB_TEMPLATE: &str = r#"web:
  image: nginx:alpine
  environment:
    APP_LABEL: "{{V}}"
    APP_ENV: "{{ENVIRONMENT}}"
"#;

const BROKEN_TEMPLATE: &str = "broken:\n  image: [unterminated\n";

/// テスト用のスタックディレクトリ
pub struct TestStack {
    pub root: TempDir,
}

impl TestStack {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let stack = Self { root };

        stack.write("stack.json", MANIFEST);
        stack.write("services/registry.json", REGISTRY);
        stack.write("services/cache/redis.yml", REDIS_TEMPLATE);
        stack.write("services/database/mysql.yml", MYSQL_TEMPLATE);
        stack.write("services/workers/laravel.yml", WORKERS_TEMPLATE);
        stack.write("services/app/web.yml", WEB_TEMPLATE);
        stack.write("services/broken/yaml.yml", BROKEN_TEMPLATE);
        stack
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.root.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    #[allow(dead_code)]
    pub fn project_env(&self, content: &str) -> PathBuf {
        let path = self.root.path().join("project/.env");
        self.write("project/.env", content);
        path
    }
}

#[allow(dead_code)]
pub fn keys(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
