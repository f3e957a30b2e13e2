crate::define_provider_ids! {
    /// Application shapes, in detection order
    ContainerId {
        SpringBoot => "spring_boot" : "Spring Boot",
        PlayFramework => "play_framework" : "Play Framework",
        DistZip => "dist_zip" : "DistZip",
        Groovy => "groovy" : "Groovy",
        Tomcat => "tomcat" : "Tomcat",
        JavaMain => "java_main" : "Java Main",
    }
}

crate::define_provider_ids! {
    /// Java runtimes; `OpenJdk` is the default
    JreId {
        OpenJdk => "open_jdk_jre" : "OpenJDK",
        SapMachine => "sap_machine_jre" : "SapMachine",
        Zulu => "zulu_jre" : "Azul Zulu",
    }
}

crate::define_provider_ids! {
    /// Supporting agents
    AgentId {
        AppDynamics => "app_dynamics_agent" : "AppDynamics",
        NewRelic => "new_relic_agent" : "New Relic",
        Jacoco => "jacoco_agent" : "JaCoCo",
        ContrastSecurity => "contrast_security_agent" : "Contrast Security",
        Debug => "debug" : "Debug",
        JavaOpts => "java_opts" : "JAVA_OPTS",
    }
}
